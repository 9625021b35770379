//! `costflow` — a deterministic cost/income simulation engine with an
//! embedded expression language.
//!
//! A declarative model describes global state (constants and time-evolving
//! variables with named growth laws) and a catalogue of resources whose
//! monetary contribution is a small program in the embedded expression
//! language. The [`simulation`] driver evolves global variables across
//! discrete periods and re-runs the [`calc_engine`] each period, producing
//! a [`report::Report`] per period.
//!
//! ```
//! use costflow::document::{build_model, Document};
//! use costflow::random::RandomSource;
//! use costflow::simulation;
//! use std::collections::HashMap;
//!
//! let yaml = r#"
//! global:
//!   const: {}
//!   variable:
//!     users:
//!       start: 100
//!       growth_rate: { type: linear, values: 0.1 }
//! cost: {}
//! income:
//!   - name: per_user_fee
//!     calculation_function: "global.users * 2"
//! "#;
//! let doc: Document = serde_yaml::from_str(yaml).unwrap();
//! let model = build_model(doc).unwrap();
//! let mut rng = RandomSource::seeded(42);
//! let report = simulation::single_report(&model, &HashMap::new(), &mut rng).unwrap();
//! assert_eq!(report.total_income, 200.0);
//! ```

pub mod ast;
pub mod calc_engine;
pub mod cli;
pub mod completion;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod random;
pub mod report;
pub mod scope;
pub mod simulation;
pub mod value;

pub use error::{EngineError, Result};
pub use model::Model;
pub use report::Report;

#[cfg(test)]
mod tests;
