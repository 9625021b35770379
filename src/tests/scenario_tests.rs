//! Seeded end-to-end scenarios (§8), exercised through the full
//! document -> Model -> simulation pipeline rather than calc_engine's
//! internal AST construction directly.

use std::collections::HashMap;

use crate::document::{build_model, Document};
use crate::random::RandomSource;
use crate::simulation::{self, SimulationOptions};

fn model_from_yaml(yaml: &str) -> crate::Model {
    let doc: Document = serde_yaml::from_str(yaml).unwrap();
    build_model(doc).unwrap()
}

#[test]
fn tiered_volume_pricing_end_to_end() {
    let model = model_from_yaml(
        r#"
global:
  const:
    users: 30000
  variable: {}
cost: {}
income:
  - name: mapbox_mobile_sdk
    use_case: routing
    calculation_method: tiered
    billing_method: monthly
    unit: call
    calculation_function: "(global.users - 25000) / 1000 * 4"
"#,
    );
    let mut rng = RandomSource::seeded(42);
    let report = simulation::single_report(&model, &HashMap::new(), &mut rng).unwrap();
    assert_eq!(report.income["income"]["mapbox_mobile_sdk"], 20.0);
    assert_eq!(report.total_income, 20.0);
}

#[test]
fn preprocess_visibility_end_to_end() {
    let model = model_from_yaml(
        r#"
global:
  const:
    users: 10
  variable: {}
cost:
  hosting:
    description: hosting costs
    resource:
      - name: compute
        calculation_function:
          preprocess:
            r: "global.users * 2"
          result: "r + 1"
income: []
"#,
    );
    let mut rng = RandomSource::seeded(42);
    let report = simulation::single_report(&model, &HashMap::new(), &mut rng).unwrap();
    assert_eq!(report.costs["hosting"]["compute"], 21.0);
}

#[test]
fn logistic_progression_over_ten_periods() {
    let model = model_from_yaml(
        r#"
global:
  const: {}
  variable:
    population:
      start: 0
      growth_rate: { type: logistic, values: { k: 1000, r: 0.5 } }
cost: {}
income: []
"#,
    );
    let mut rng = RandomSource::seeded(42);
    let reports = simulation::simulate(
        &model,
        10,
        &HashMap::new(),
        &mut rng,
        &SimulationOptions {
            include_initial: true,
            show_progress: false,
        },
    )
    .unwrap();
    let v9 = reports[9].globals["population"];
    let v10 = reports[10].globals["population"];
    assert!(v10 > 500.0 && v10 < 1000.0);
    assert!(v10 > v9);
}

#[test]
fn case_fall_through_end_to_end() {
    let model = model_from_yaml(
        r#"
global:
  const:
    x: 5
  variable: {}
cost:
  tier:
    description: tiered case resource
    resource:
      - name: banded
        calculation_function:
          cases:
            - case: "global.x < 0"
              result: "1"
            - case: "global.x < 10"
              result: "2"
            - case: "global.x >= 10"
              result: "3"
income: []
"#,
    );
    let mut rng = RandomSource::seeded(42);
    let report = simulation::single_report(&model, &HashMap::new(), &mut rng).unwrap();
    assert_eq!(report.costs["tier"]["banded"], 2.0);
}
