//! Report output: pretty JSON, CSV, gzip-compressed JSON, and JSONL
//! streaming, grounded on the teacher's `result.rs::save_to_file` and the
//! `--csv-output`/`--compress`/`--stream-output` handling in `main.rs`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{EngineError, Result};
use crate::report::Report;

/// Writes reports as pretty-printed JSON.
pub fn write_json(reports: &[Report], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(EngineError::ReportWrite)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, reports).map_err(|e| EngineError::ReportWrite(e.into()))
}

/// Writes reports as gzip-compressed JSON.
pub fn write_json_gz(reports: &[Report], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(EngineError::ReportWrite)?;
    let encoder = GzEncoder::new(file, Compression::default());
    serde_json::to_writer(encoder, reports).map_err(|e| EngineError::ReportWrite(e.into()))
}

/// Writes one JSON object per line (JSONL), appending to `path` if it
/// already exists — the form used by `--stream` to avoid holding every
/// `Report` in memory for a long simulation.
pub fn append_jsonl(report: &Report, path: &Path) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(EngineError::ReportWrite)?;
    let line = serde_json::to_string(report).map_err(|e| EngineError::ReportWrite(e.into()))?;
    writeln!(file, "{}", line).map_err(EngineError::ReportWrite)
}

/// Writes reports as CSV, one row per period: `period, total_cost,
/// total_income, net_result`, followed by one column per global variable
/// and per cost/income resource (flattened as `category.resource`).
pub fn write_csv(reports: &[Report], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(EngineError::ReportWrite)?;
    let mut writer = csv::Writer::from_writer(file);

    let Some(first) = reports.first() else {
        return writer.flush().map_err(EngineError::ReportWrite);
    };

    let mut header = vec!["period".to_string(), "total_cost".to_string(), "total_income".to_string(), "net_result".to_string()];
    for name in first.globals.keys() {
        header.push(format!("global.{}", name));
    }
    for (cat, resources) in &first.costs {
        for res in resources.keys() {
            header.push(format!("cost.{}.{}", cat, res));
        }
    }
    for (cat, resources) in &first.income {
        for res in resources.keys() {
            header.push(format!("income.{}.{}", cat, res));
        }
    }
    writer
        .write_record(&header)
        .map_err(|e| EngineError::ReportWrite(to_io_error(e)))?;

    for report in reports {
        let mut row = vec![
            report.period.to_string(),
            report.total_cost.to_string(),
            report.total_income.to_string(),
            report.net_result.to_string(),
        ];
        for name in first.globals.keys() {
            row.push(report.globals.get(name).copied().unwrap_or(0.0).to_string());
        }
        for (cat, resources) in &first.costs {
            for res in resources.keys() {
                let v = report
                    .costs
                    .get(cat)
                    .and_then(|r| r.get(res))
                    .copied()
                    .unwrap_or(0.0);
                row.push(v.to_string());
            }
        }
        for (cat, resources) in &first.income {
            for res in resources.keys() {
                let v = report
                    .income
                    .get(cat)
                    .and_then(|r| r.get(res))
                    .copied()
                    .unwrap_or(0.0);
                row.push(v.to_string());
            }
        }
        writer
            .write_record(&row)
            .map_err(|e| EngineError::ReportWrite(to_io_error(e)))?;
    }

    writer.flush().map_err(EngineError::ReportWrite)
}

fn to_io_error(e: csv::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::Builder;

    fn sample_report(period: u64) -> Report {
        let mut globals = IndexMap::new();
        globals.insert("users".to_string(), 100.0);
        let mut costs = IndexMap::new();
        let mut hosting = IndexMap::new();
        hosting.insert("sdk".to_string(), 5.0);
        costs.insert("hosting".to_string(), hosting);
        Report {
            period,
            timestamp: None,
            globals,
            costs,
            income: IndexMap::new(),
            total_cost: 5.0,
            total_income: 0.0,
            net_result: -5.0,
        }
    }

    #[test]
    fn writes_json() {
        let dir = Builder::new().prefix("costflow-io-test").tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&[sample_report(0)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"total_cost\""));
    }

    #[test]
    fn writes_csv_with_header() {
        let dir = Builder::new().prefix("costflow-io-test").tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_csv(&[sample_report(0), sample_report(1)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().contains("cost.hosting.sdk"));
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn appends_jsonl_lines() {
        let dir = Builder::new().prefix("costflow-io-test").tempdir().unwrap();
        let path = dir.path().join("stream.jsonl");
        append_jsonl(&sample_report(0), &path).unwrap();
        append_jsonl(&sample_report(1), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
