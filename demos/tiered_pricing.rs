//! Library-usage demo: builds a small tiered-pricing model in code (no
//! document parsing) and prints a 12-period simulation as JSON.

use std::collections::HashMap;

use costflow::document::{build_model, Document};
use costflow::random::RandomSource;
use costflow::simulation::{self, SimulationOptions};

fn main() {
    let yaml = r#"
global:
  const: {}
  variable:
    users:
      start: 20000
      growth_rate: { type: linear, values: 0.08 }
cost: {}
income:
  - name: mapbox_mobile_sdk
    use_case: routing
    calculation_method: tiered
    billing_method: monthly
    unit: call
    calculation_function:
      cases:
        - case: "global.users < 25000"
          result: "0"
        - case: "global.users >= 25000"
          result: "(global.users - 25000) / 1000 * 4"
"#;

    let doc: Document = serde_yaml::from_str(yaml).expect("valid document");
    let model = build_model(doc).expect("valid model");

    let mut rng = RandomSource::seeded(42);
    let reports = simulation::simulate(
        &model,
        12,
        &HashMap::new(),
        &mut rng,
        &SimulationOptions {
            include_initial: true,
            show_progress: false,
        },
    )
    .expect("simulation succeeds");

    println!("{}", serde_json::to_string_pretty(&reports).unwrap());
}
