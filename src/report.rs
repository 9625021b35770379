//! The per-period Report (§6.3).
//!
//! At minimum a Report carries a host-set timestamp, a flat globals
//! snapshot, per-category per-resource totals for cost and income, and the
//! three aggregate totals. The engine itself never stamps a timestamp —
//! that would break the bit-reproducibility invariant (§8) for
//! random-free models — so `timestamp` starts `None` and is filled in by
//! the host boundary (`io.rs`) just before serialization.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub period: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub globals: IndexMap<String, Value>,
    pub costs: IndexMap<String, IndexMap<String, Value>>,
    pub income: IndexMap<String, IndexMap<String, Value>>,
    pub total_cost: Value,
    pub total_income: Value,
    pub net_result: Value,
}

impl Report {
    /// Stamps the report with the current wall-clock time, if it doesn't
    /// already carry one.
    pub fn stamp_now(&mut self) {
        if self.timestamp.is_none() {
            self.timestamp = Some(Utc::now());
        }
    }
}
