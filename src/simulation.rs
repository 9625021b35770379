//! The Simulation Driver (component E, §4.E).
//!
//! Evolves global variables across discrete periods using growth laws,
//! invoking the Calculation Engine once per period. Progress reporting and
//! logging follow the teacher's `engine.rs::run_with_progress` cadence:
//! one tick and one `log::debug!` per period.

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use crate::calc_engine;
use crate::error::Result;
use crate::model::Model;
use crate::random::RandomSource;
use crate::report::Report;
use crate::value::Value;

/// Options controlling a simulation run. `include_initial` resolves
/// spec.md's own stated ambiguity (§4.E "Termination", §9 "Open
/// questions"): default `true` emits the `t=0` snapshot before the `N`
/// subsequent periods, for `N+1` reports total.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub include_initial: bool,
    pub show_progress: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            include_initial: true,
            show_progress: false,
        }
    }
}

/// Builds the initial global scope: every constant, plus every variable's
/// `start`, with `overrides` applied last (§6.4 `overrides: name->number`).
pub fn initial_globals(model: &Model, overrides: &HashMap<String, Value>) -> HashMap<String, Value> {
    let mut globals = HashMap::new();
    for (name, value) in &model.globals.consts {
        globals.insert(name.clone(), *value);
    }
    for (name, spec) in &model.globals.variables {
        globals.insert(name.clone(), spec.start);
    }
    for (name, value) in overrides {
        globals.insert(name.clone(), *value);
    }
    globals
}

/// Advances every global variable one period's worth according to its
/// growth law, clamping to `max`/`min` where declared, and writes the new
/// values back into `globals` (§4.E "Per-period update").
///
/// `period` divides the effective growth-law time index by each
/// variable's `period` cadence (default 1): a variable with `period = 3`
/// only advances its growth law once every three simulation periods.
fn apply_growth(model: &Model, globals: &mut HashMap<String, Value>, t: u64) {
    for (name, spec) in &model.globals.variables {
        let cadence = spec.period.max(1) as u64;
        let effective_t = t / cadence;
        let mut value = spec.growth.value_at(spec.start, effective_t);
        if let Some(max) = spec.max {
            value = value.min(max);
        }
        if let Some(min) = spec.min {
            value = value.max(min);
        }
        globals.insert(name.clone(), value);
    }
}

/// `single_report(model, overrides)` (§6.4): evaluates the model once at
/// `t = 0` with no growth applied.
pub fn single_report(
    model: &Model,
    overrides: &HashMap<String, Value>,
    rng: &mut RandomSource,
) -> Result<Report> {
    let globals = initial_globals(model, overrides);
    calc_engine::evaluate(model, &globals, rng, 0)
}

/// `simulate(model, periods, overrides)` (§6.4): runs `periods` periods,
/// applying growth before each re-evaluation, and returns one `Report`
/// per period (plus the initial snapshot, per `options.include_initial`).
pub fn simulate(
    model: &Model,
    periods: u64,
    overrides: &HashMap<String, Value>,
    rng: &mut RandomSource,
    options: &SimulationOptions,
) -> Result<Vec<Report>> {
    let mut globals = initial_globals(model, overrides);
    let mut reports = Vec::new();

    let progress = if options.show_progress {
        let pb = ProgressBar::new(periods);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} periods ({eta})")
                .expect("static template is valid"),
        );
        Some(pb)
    } else {
        None
    };

    if options.include_initial {
        debug!("evaluating initial snapshot at t=0");
        reports.push(calc_engine::evaluate(model, &globals, rng, 0)?);
    }

    for t in 1..=periods {
        debug!("applying growth laws for period {}", t);
        apply_growth(model, &mut globals, t);
        let report = calc_engine::evaluate(model, &globals, rng, t)?;
        reports.push(report);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GrowthSpec, Globals, VariableSpec};
    use indexmap::IndexMap;

    fn linear_model(rate: f64, start: f64) -> Model {
        let mut variables = IndexMap::new();
        variables.insert(
            "balance".to_string(),
            VariableSpec {
                start,
                max: None,
                min: None,
                period: 1,
                growth: GrowthSpec::Linear { rate },
            },
        );
        Model {
            globals: Globals {
                consts: IndexMap::new(),
                variables,
            },
            cost: IndexMap::new(),
            income: IndexMap::new(),
        }
    }

    #[test]
    fn linear_growth_matches_closed_form() {
        let model = linear_model(0.1, 100.0);
        let mut rng = RandomSource::seeded(1);
        let reports = simulate(
            &model,
            5,
            &HashMap::new(),
            &mut rng,
            &SimulationOptions {
                include_initial: true,
                show_progress: false,
            },
        )
        .unwrap();
        assert_eq!(reports.len(), 6); // t=0..=5
        let expected = 100.0 * 1.1f64.powi(5);
        assert!((reports[5].globals["balance"] - expected).abs() < 1e-9);
    }

    #[test]
    fn include_initial_false_yields_n_reports() {
        let model = linear_model(0.05, 10.0);
        let mut rng = RandomSource::seeded(1);
        let reports = simulate(
            &model,
            3,
            &HashMap::new(),
            &mut rng,
            &SimulationOptions {
                include_initial: false,
                show_progress: false,
            },
        )
        .unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].period, 1);
    }

    #[test]
    fn clamping_respects_max_and_min() {
        let mut variables = IndexMap::new();
        variables.insert(
            "x".to_string(),
            VariableSpec {
                start: 1.0,
                max: Some(5.0),
                min: Some(0.0),
                period: 1,
                growth: GrowthSpec::Increment { step: 10.0 },
            },
        );
        let model = Model {
            globals: Globals {
                consts: IndexMap::new(),
                variables,
            },
            cost: IndexMap::new(),
            income: IndexMap::new(),
        };
        let mut globals = initial_globals(&model, &HashMap::new());
        apply_growth(&model, &mut globals, 1);
        assert_eq!(globals["x"], 5.0);
    }

    #[test]
    fn overrides_apply_before_first_period() {
        let model = linear_model(0.0, 10.0);
        let mut overrides = HashMap::new();
        overrides.insert("balance".to_string(), 42.0);
        let mut rng = RandomSource::seeded(1);
        let report = single_report(&model, &overrides, &mut rng).unwrap();
        assert_eq!(report.globals["balance"], 42.0);
    }
}
