//! The Calculation Engine (component D, §4.D).
//!
//! For a given Model and global Scope snapshot, evaluates every Resource
//! and assembles a Report. Category and resource order are preserved
//! exactly as declared in the Model (backed by `IndexMap`).

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::{Expr, Stmt};
use crate::error::{EngineError, ResourcePath, Result};
use crate::evaluator::eval;
use crate::model::{Aggregation, Body, CalcFn, Category, Model};
use crate::random::RandomSource;
use crate::report::Report;
use crate::scope::Scope;
use crate::value::Value;

/// Runs the full per-resource procedure of §4.D for one resource, wrapping
/// any error with the resource's path.
fn evaluate_resource(
    path: &ResourcePath,
    function: &CalcFn,
    globals: &HashMap<String, Value>,
    rng: &mut RandomSource,
) -> Result<Value> {
    run(function, globals, rng).map_err(|e| e.at_resource(path.clone()))
}

pub(crate) fn run(function: &CalcFn, globals: &HashMap<String, Value>, rng: &mut RandomSource) -> Result<Value> {
    let mut scope = Scope::new(globals.clone());
    match function {
        CalcFn::Direct(expr) => eval(expr, &mut scope, rng),
        CalcFn::Structured { preprocess, body } => {
            run_preprocess(preprocess, &mut scope, rng)?;
            run_body(body, &mut scope, rng)
        }
    }
}

fn run_preprocess(
    preprocess: &[(String, Expr)],
    scope: &mut Scope,
    rng: &mut RandomSource,
) -> Result<()> {
    for (name, expr) in preprocess {
        let value = eval(expr, scope, rng)?;
        scope.set(name, value);
    }
    Ok(())
}

fn run_body(body: &Body, scope: &mut Scope, rng: &mut RandomSource) -> Result<Value> {
    match body {
        Body::Direct(expr) => eval(expr, scope, rng),

        Body::Cases(cases) => {
            for (cond, result) in cases {
                if crate::value::truthy(eval(cond, scope, rng)?) {
                    return eval(result, scope, rng);
                }
            }
            Err(EngineError::NoMatchingCase(ResourcePath::default()))
        }

        Body::Exec(stmts) => {
            run_stmts(stmts, scope, rng)?;
            scope.get("result")
        }

        Body::ForLoop {
            iterator,
            aggregation,
            exec,
        } => run_for_loop(iterator, *aggregation, exec, scope, rng),
    }
}

fn run_stmts(stmts: &[Stmt], scope: &mut Scope, rng: &mut RandomSource) -> Result<()> {
    for stmt in stmts {
        match stmt {
            Stmt::Expr(e) => {
                eval(e, scope, rng)?;
            }
            Stmt::Assign { name, value, .. } => {
                let v = eval(value, scope, rng)?;
                scope.set(name, v);
            }
        }
    }
    Ok(())
}

fn run_for_loop(
    iterator: &Expr,
    aggregation: Aggregation,
    exec: &[Stmt],
    scope: &mut Scope,
    rng: &mut RandomSource,
) -> Result<Value> {
    let raw_n = eval(iterator, scope, rng)?;
    let n = raw_n.trunc() as i64;

    // Documented degenerate policy (§4.D): n <= 0 aggregates to 0.0 for
    // every aggregation kind, including max/min (not ±infinity).
    if n <= 0 {
        return Ok(0.0);
    }

    let mut results = Vec::with_capacity(n as usize);
    for i in 1..=n {
        scope.push_layer();
        scope.bind("i", i as f64);
        let outcome = run_stmts(exec, scope, rng).and_then(|_| scope.get("result"));
        scope.pop_layer();
        results.push(outcome?);
    }

    Ok(match aggregation {
        Aggregation::Sum => results.iter().sum(),
        Aggregation::Average => results.iter().sum::<f64>() / n as f64,
        Aggregation::Max => results.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Min => results.iter().cloned().fold(f64::INFINITY, f64::min),
    })
}

fn evaluate_category(
    category_name: &str,
    category: &Category,
    globals: &HashMap<String, Value>,
    rng: &mut RandomSource,
) -> Result<(IndexMap<String, Value>, Value)> {
    let mut totals = IndexMap::new();
    let mut sum = 0.0;
    for resource in &category.resources {
        let path = ResourcePath {
            category: Some(category_name.to_string()),
            resource: Some(resource.name.clone()),
        };
        let value = evaluate_resource(&path, &resource.function, globals, rng)?;
        totals.insert(resource.name.clone(), value);
        sum += value;
    }
    Ok((totals, sum))
}

/// Evaluates every resource in the Model against `globals` and assembles a
/// Report for `period`. The report's `timestamp` is left unset (see
/// `report.rs`).
pub fn evaluate(
    model: &Model,
    globals: &HashMap<String, Value>,
    rng: &mut RandomSource,
    period: u64,
) -> Result<Report> {
    let mut costs = IndexMap::new();
    let mut total_cost = 0.0;
    for (name, category) in &model.cost {
        let (totals, sum) = evaluate_category(name, category, globals, rng)?;
        total_cost += sum;
        costs.insert(name.clone(), totals);
    }

    let mut income = IndexMap::new();
    let mut total_income = 0.0;
    for (name, category) in &model.income {
        let (totals, sum) = evaluate_category(name, category, globals, rng)?;
        total_income += sum;
        income.insert(name.clone(), totals);
    }

    let globals_snapshot: IndexMap<String, Value> = model
        .globals
        .consts
        .keys()
        .chain(model.globals.variables.keys())
        .map(|k| (k.clone(), globals[k]))
        .collect();

    Ok(Report {
        period,
        timestamp: None,
        globals: globals_snapshot,
        costs,
        income,
        total_cost,
        total_income,
        net_result: total_income - total_cost,
    })
}
