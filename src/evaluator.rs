//! Tree-walking evaluator (component C, §4.C).
//!
//! A pure function of `(Expr, &mut Scope, &mut RandomSource)`. No node
//! mutates anything outside the Scope it is given; reproducibility for a
//! fixed seed follows directly from that.

use crate::ast::{BinOp, Expr, UnOp};
use crate::error::{EngineError, Result};
use crate::random::RandomSource;
use crate::scope::Scope;
use crate::value::{from_bool, truthy, Value};

/// Magnitude below which a divisor is treated as zero (§4.C).
const DIVISION_EPSILON: f64 = 1e-300;

pub fn eval(expr: &Expr, scope: &mut Scope, rng: &mut RandomSource) -> Result<Value> {
    match expr {
        Expr::NumberLit { value, .. } => Ok(*value),

        Expr::Name { name, .. } => scope.get(name),

        Expr::QualifiedName {
            qualifier, name, ..
        } => {
            if qualifier == "global" {
                scope.get_global(name)
            } else {
                Err(EngineError::UndefinedName(format!("{}.{}", qualifier, name)))
            }
        }

        Expr::Paren { inner, .. } => eval(inner, scope, rng),

        Expr::Unary { op, operand, .. } => {
            let v = eval(operand, scope, rng)?;
            match op {
                UnOp::Neg => check_finite(-v),
                UnOp::Pos => check_finite(v),
            }
        }

        Expr::NotOp { operand, .. } => {
            let v = eval(operand, scope, rng)?;
            Ok(from_bool(!truthy(v)))
        }

        Expr::Binary { op, lhs, rhs, .. } => eval_binary(*op, lhs, rhs, scope, rng),

        Expr::Call { name, args, .. } => eval_call(name, args, scope, rng),
    }
}

fn eval_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &mut Scope,
    rng: &mut RandomSource,
) -> Result<Value> {
    // `and`/`or` short-circuit; every other operator evaluates both sides.
    match op {
        BinOp::And => {
            let l = eval(lhs, scope, rng)?;
            if !truthy(l) {
                return Ok(from_bool(false));
            }
            let r = eval(rhs, scope, rng)?;
            return Ok(from_bool(truthy(r)));
        }
        BinOp::Or => {
            let l = eval(lhs, scope, rng)?;
            if truthy(l) {
                return Ok(from_bool(true));
            }
            let r = eval(rhs, scope, rng)?;
            return Ok(from_bool(truthy(r)));
        }
        _ => {}
    }

    let l = eval(lhs, scope, rng)?;
    let r = eval(rhs, scope, rng)?;

    match op {
        BinOp::Add => check_finite(l + r),
        BinOp::Sub => check_finite(l - r),
        BinOp::Mul => check_finite(l * r),
        BinOp::Div => {
            if r.abs() < DIVISION_EPSILON {
                Err(EngineError::DivisionByZero)
            } else {
                check_finite(l / r)
            }
        }
        BinOp::Pow => {
            if l < 0.0 && r.fract() != 0.0 {
                return Err(EngineError::DomainError(format!(
                    "{} ** {}: negative base with non-integer exponent",
                    l, r
                )));
            }
            check_finite(l.powf(r))
        }
        BinOp::Eq => Ok(from_bool(l == r)),
        BinOp::Ne => Ok(from_bool(l != r)),
        BinOp::Lt => Ok(from_bool(l < r)),
        BinOp::Le => Ok(from_bool(l <= r)),
        BinOp::Gt => Ok(from_bool(l > r)),
        BinOp::Ge => Ok(from_bool(l >= r)),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

fn eval_call(name: &str, args: &[Expr], scope: &mut Scope, rng: &mut RandomSource) -> Result<Value> {
    match name {
        "random" => {
            if args.len() != 3 {
                return Err(EngineError::RandomArgument(format!(
                    "$random expects exactly 3 arguments, got {}",
                    args.len()
                )));
            }
            let min = eval(&args[0], scope, rng)?;
            let max = eval(&args[1], scope, rng)?;
            let mean = eval(&args[2], scope, rng)?;
            rng.skewed(min, max, mean)
        }
        other => Err(EngineError::UndefinedName(format!("${}", other))),
    }
}

fn check_finite(v: Value) -> Result<Value> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EngineError::NumericOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use std::collections::HashMap;

    fn eval_str(src: &str, globals: &[(&str, f64)]) -> Result<Value> {
        let expr = Parser::parse_expr_str(src)?;
        let globals: HashMap<String, Value> =
            globals.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        let mut scope = Scope::new(globals);
        let mut rng = RandomSource::seeded(1);
        eval(&expr, &mut scope, &mut rng)
    }

    #[test]
    fn arithmetic_matches_ieee_double() {
        assert_eq!(eval_str("2 + 3 * 4", &[]).unwrap(), 2.0 + 3.0 * 4.0);
        assert_eq!(eval_str("2 ** 10", &[]).unwrap(), 1024.0);
    }

    #[test]
    fn division_by_near_zero_fails() {
        assert!(matches!(
            eval_str("1 / 0", &[]),
            Err(EngineError::DivisionByZero)
        ));
        assert!(matches!(
            eval_str("1 / 1e-301", &[]),
            Err(EngineError::DivisionByZero)
        ));
    }

    #[test]
    fn negative_base_noninteger_exponent_is_domain_error() {
        assert!(matches!(
            eval_str("(-4) ** 0.5", &[]),
            Err(EngineError::DomainError(_))
        ));
        // Integer exponent is fine even with a negative base.
        assert_eq!(eval_str("(-2) ** 3", &[]).unwrap(), -8.0);
    }

    #[test]
    fn comparisons_are_bit_exact() {
        assert_eq!(eval_str("1 == 1", &[]).unwrap(), 1.0);
        assert_eq!(eval_str("1 == 1.0000001", &[]).unwrap(), 0.0);
        assert_eq!(eval_str("3 <= 3", &[]).unwrap(), 1.0);
    }

    #[test]
    fn logical_short_circuit_and_not() {
        assert_eq!(eval_str("0 and (1/0)", &[]).unwrap(), 0.0);
        assert_eq!(eval_str("1 or (1/0)", &[]).unwrap(), 1.0);
        assert_eq!(eval_str("not 0", &[]).unwrap(), 1.0);
        assert_eq!(eval_str("not 5", &[]).unwrap(), 0.0);
    }

    #[test]
    fn qualified_global_lookup() {
        assert_eq!(
            eval_str("global.users + 1", &[("users", 10.0)]).unwrap(),
            11.0
        );
    }

    #[test]
    fn random_dispatch_within_bounds() {
        let v = eval_str("$random(0, 10, 5)", &[]).unwrap();
        assert!((0.0..=10.0).contains(&v));
    }
}
