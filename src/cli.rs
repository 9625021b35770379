//! Command-line surface: `clap`-derived `Args`/subcommands, modeled on the
//! teacher's flat `Args` struct with `Option<T>` overrides layered onto a
//! loaded configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "costflow")]
#[command(about = "Deterministic cost/income simulation engine")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level, e.g. "info" or "costflow=debug". Can also be set via
    /// the RUST_LOG environment variable.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Disable colored terminal output.
    #[arg(long, default_value_t = false, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evaluate the model once at t=0 and print a single Report.
    Run {
        /// Path to the configuration document (.yaml/.yml/.json/.toml).
        #[arg(short, long)]
        config: PathBuf,

        /// Override a global value: NAME=VALUE. Repeatable.
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(String, f64)>,

        /// Random source seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Write the Report as JSON to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run N periods and print/write the resulting sequence of Reports.
    Simulate {
        #[arg(short, long)]
        config: PathBuf,

        /// Number of periods to simulate.
        #[arg(short, long)]
        periods: u64,

        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(String, f64)>,

        #[arg(long)]
        seed: Option<u64>,

        /// Omit the t=0 snapshot (default includes it).
        #[arg(long, default_value_t = false)]
        no_initial: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a CSV report to this path alongside (or instead of) JSON.
        #[arg(long)]
        csv_output: Option<PathBuf>,

        /// Gzip-compress the JSON output.
        #[arg(long, default_value_t = false)]
        compress: bool,

        /// Append one JSON object per period to this path as it's computed.
        #[arg(long)]
        stream: Option<PathBuf>,

        /// Hide the progress bar.
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },

    /// Interactively evaluate expressions against a user-supplied scope.
    Repl {
        /// Seed value=name pairs for the starting scope. Repeatable.
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(String, f64)>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print category/resource names, counts, and declared growth laws
    /// without running a simulation.
    DescribeModel {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print a shell completion script to stdout.
    Completions {
        /// One of bash, zsh, fish, powershell (or pwsh).
        shell: String,
    },
}

fn parse_override(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", value))?;
    Ok((name.to_string(), value))
}

pub fn overrides_map(pairs: &[(String, f64)]) -> HashMap<String, f64> {
    pairs.iter().cloned().collect()
}
