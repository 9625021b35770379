//! The in-memory Model (§3) and the validation that turns a parsed
//! document into one.
//!
//! A `Model` is built once and never mutated afterward (§3 "Lifecycle").
//! Every resource's expression strings are parsed exactly once here and
//! the resulting AST is kept alongside the resource (§9 "Cached parsing").

use std::str::FromStr;

use indexmap::IndexMap;
use strum_macros::EnumString;

use crate::ast::{Expr, Stmt};
use crate::error::{EngineError, Result};
use crate::scope::is_reserved;
use crate::value::Value;

/// A growth law, tagged by variant, carrying its parameters inline
/// (§3 "GrowthSpec", §9 "Growth law dispatch").
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthSpec {
    Linear { rate: Value },
    Polynomial { coefficients: Vec<Value> },
    Logistic { k: Value, r: Value },
    Increment { step: Value },
}

impl GrowthSpec {
    /// Evaluates `v(t)` for this growth law given the variable's `start`.
    pub fn value_at(&self, start: Value, t: u64) -> Value {
        let t = t as f64;
        match self {
            GrowthSpec::Linear { rate } => start * (1.0 + rate).powf(t),
            GrowthSpec::Polynomial { coefficients } => coefficients
                .iter()
                .enumerate()
                .map(|(i, c)| c * t.powi(i as i32))
                .sum(),
            GrowthSpec::Logistic { k, r } => {
                let n0 = if start == 0.0 { (k * 0.001).max(start) } else { start };
                k / (1.0 + ((k - n0) / n0) * (-r * t).exp())
            }
            GrowthSpec::Increment { step } => start + step * t,
        }
    }
}

/// `{ start, max?, min?, period?, growth }` (§3 "VariableSpec").
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    pub start: Value,
    pub max: Option<Value>,
    pub min: Option<Value>,
    pub period: i64,
    pub growth: GrowthSpec,
}

/// The `(const, variable)` pair of global state (§3 "Globals").
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub consts: IndexMap<String, Value>,
    pub variables: IndexMap<String, VariableSpec>,
}

/// The parsed form of a `CalcFn` (§3): either a single cached expression,
/// or a structured body with an optional preprocess map.
#[derive(Debug, Clone)]
pub enum CalcFn {
    Direct(Expr),
    Structured {
        preprocess: Vec<(String, Expr)>,
        body: Body,
    },
}

#[derive(Debug, Clone)]
pub enum Body {
    Direct(Expr),
    Cases(Vec<(Expr, Expr)>),
    ForLoop {
        iterator: Expr,
        aggregation: Aggregation,
        exec: Vec<Stmt>,
    },
    Exec(Vec<Stmt>),
}

/// The for-loop reduction kind, parsed from the document's `aggregation`
/// string the way the teacher parses `Scenario` from its config string
/// (`EnumString` derive rather than a hand-rolled match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Average,
    Max,
    Min,
}

impl Aggregation {
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str(s).map_err(|_| EngineError::InvalidAggregation(s.to_string()))
    }
}

/// A leaf of the cost/income tree (§3 "Resource").
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub use_case: String,
    pub calculation_method: String,
    pub billing_method: String,
    pub unit: String,
    pub function: CalcFn,
}

/// `{ description, resources }` (§3 "Categories").
#[derive(Debug, Clone)]
pub struct Category {
    pub description: String,
    pub resources: Vec<Resource>,
}

/// The immutable, built Model (§3 "Model").
#[derive(Debug, Clone)]
pub struct Model {
    pub globals: Globals,
    pub cost: IndexMap<String, Category>,
    pub income: IndexMap<String, Category>,
}

impl Model {
    /// Validates the structural invariants of §3 that survive past parsing
    /// (name collisions among globals, reserved names). Per-resource
    /// preprocess/local collisions are intentionally not checked here: the
    /// local scope shadowing a global is explicitly allowed (invariant 1),
    /// so only global-against-global collisions are a build-time error.
    pub fn validate(&self) -> Result<()> {
        for name in self.globals.consts.keys() {
            if is_reserved(name) {
                return Err(EngineError::ReservedName(name.clone()));
            }
            if self.globals.variables.contains_key(name) {
                return Err(EngineError::Model(format!(
                    "global name '{}' declared as both const and variable",
                    name
                )));
            }
        }
        for name in self.globals.variables.keys() {
            if is_reserved(name) {
                return Err(EngineError::ReservedName(name.clone()));
            }
        }
        for (cat_name, cat) in self.cost.iter().chain(self.income.iter()) {
            let mut seen = std::collections::HashSet::new();
            for r in &cat.resources {
                if !seen.insert(&r.name) {
                    return Err(EngineError::Model(format!(
                        "duplicate resource name '{}' in category '{}'",
                        r.name, cat_name
                    )));
                }
                check_reserved_in_calc_fn(&r.function)?;
            }
        }
        Ok(())
    }
}

/// Enforces invariant 2 past the global names already checked above: a
/// resource's preprocess bindings and exec/for-loop assignments may not
/// bind a reserved identifier, except `result` (the engine-provided
/// exec/for-loop output slot). `i` is bound by the engine only and is never
/// a valid assignment target.
fn check_reserved_in_calc_fn(function: &CalcFn) -> Result<()> {
    match function {
        CalcFn::Direct(_) => Ok(()),
        CalcFn::Structured { preprocess, body } => {
            for (name, _) in preprocess {
                if is_reserved(name) {
                    return Err(EngineError::ReservedName(name.clone()));
                }
            }
            check_reserved_in_body(body)
        }
    }
}

fn check_reserved_in_body(body: &Body) -> Result<()> {
    match body {
        Body::Direct(_) | Body::Cases(_) => Ok(()),
        Body::Exec(stmts) => check_reserved_in_stmts(stmts),
        Body::ForLoop { exec, .. } => check_reserved_in_stmts(exec),
    }
}

fn check_reserved_in_stmts(stmts: &[Stmt]) -> Result<()> {
    for stmt in stmts {
        if let Stmt::Assign { name, .. } = stmt {
            if name != "result" && is_reserved(name) {
                return Err(EngineError::ReservedName(name.clone()));
            }
        }
    }
    Ok(())
}
