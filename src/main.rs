use clap::Parser;
use colored::Colorize;
use log::info;

use costflow::cli::{overrides_map, Args, Command};
use costflow::completion::{generate_completion, parse_shell_name};
use costflow::document::load_model;
use costflow::parser::Parser as ExprParser;
use costflow::random::RandomSource;
use costflow::scope::Scope;
use costflow::simulation::{self, SimulationOptions};
use costflow::{evaluator, io};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &args.log_level);
    }
    env_logger::init();

    match args.command {
        Command::Run {
            config,
            overrides,
            seed,
            output,
        } => run_command(config, overrides, seed, output),
        Command::Simulate {
            config,
            periods,
            overrides,
            seed,
            no_initial,
            output,
            csv_output,
            compress,
            stream,
            no_progress,
        } => simulate_command(
            config, periods, overrides, seed, no_initial, output, csv_output, compress, stream,
            no_progress,
        ),
        Command::Repl { overrides, seed } => repl_command(overrides, seed),
        Command::DescribeModel { config } => describe_model_command(config),
        Command::Completions { shell } => completions_command(&shell),
    }
}

fn completions_command(shell: &str) -> Result<(), Box<dyn std::error::Error>> {
    let shell = parse_shell_name(shell)
        .ok_or_else(|| format!("unsupported shell '{}' (try bash, zsh, fish, powershell)", shell))?;
    let mut stdout = std::io::stdout();
    generate_completion::<Args>(shell, "costflow", &mut stdout);
    Ok(())
}

fn run_command(
    config: std::path::PathBuf,
    overrides: Vec<(String, f64)>,
    seed: Option<u64>,
    output: Option<std::path::PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading model from {}", config.display());
    let model = load_model(&config)?;
    let overrides = overrides_map(&overrides);
    let mut rng = seed.map(RandomSource::seeded).unwrap_or_default();

    let mut report = simulation::single_report(&model, &overrides, &mut rng)?;
    report.stamp_now();

    match output {
        Some(path) => io::write_json(std::slice::from_ref(&report), &path)?,
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    println!(
        "{} net result: {:.2}",
        "costflow".cyan().bold(),
        report.net_result
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn simulate_command(
    config: std::path::PathBuf,
    periods: u64,
    overrides: Vec<(String, f64)>,
    seed: Option<u64>,
    no_initial: bool,
    output: Option<std::path::PathBuf>,
    csv_output: Option<std::path::PathBuf>,
    compress: bool,
    stream: Option<std::path::PathBuf>,
    no_progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading model from {}", config.display());
    let model = load_model(&config)?;
    let overrides = overrides_map(&overrides);
    let mut rng = seed.map(RandomSource::seeded).unwrap_or_default();

    let options = SimulationOptions {
        include_initial: !no_initial,
        show_progress: !no_progress,
    };
    let mut reports = simulation::simulate(&model, periods, &overrides, &mut rng, &options)?;
    for report in &mut reports {
        report.stamp_now();
        if let Some(path) = &stream {
            io::append_jsonl(report, path)?;
        }
    }

    if let Some(path) = &output {
        if compress {
            io::write_json_gz(&reports, path)?;
        } else {
            io::write_json(&reports, path)?;
        }
    }
    if let Some(path) = &csv_output {
        io::write_csv(&reports, path)?;
    }
    if output.is_none() && csv_output.is_none() && stream.is_none() {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if let Some(last) = reports.last() {
        println!(
            "{} {} periods simulated, final net result: {:.2}",
            "costflow".cyan().bold(),
            reports.len(),
            last.net_result
        );
    }
    Ok(())
}

fn repl_command(
    overrides: Vec<(String, f64)>,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let globals = overrides_map(&overrides);
    let mut rng = seed.map(RandomSource::seeded).unwrap_or_default();
    println!(
        "{}",
        "costflow repl — enter expressions, Ctrl-D to exit".green()
    );

    let mut editor = rustyline::DefaultEditor::new()?;
    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                if line.trim().is_empty() {
                    continue;
                }
                let mut scope = Scope::new(globals.clone());
                match ExprParser::parse_expr_str(&line) {
                    Ok(expr) => match evaluator::eval(&expr, &mut scope, &mut rng) {
                        Ok(value) => println!("{}", value),
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    },
                    Err(e) => eprintln!("{}", e.to_string().red()),
                }
            }
            Err(_) => break,
        }
    }
    Ok(())
}

fn describe_model_command(
    config: std::path::PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = load_model(&config)?;
    println!("{}", "globals".cyan().bold());
    println!("  const: {} entries", model.globals.consts.len());
    for (name, spec) in &model.globals.variables {
        println!("  variable {}: start={} growth={:?}", name, spec.start, spec.growth);
    }
    for (label, categories) in [("cost", &model.cost), ("income", &model.income)] {
        println!("{}", label.cyan().bold());
        for (name, category) in categories {
            println!(
                "  {} ({} resources): {}",
                name,
                category.resources.len(),
                category.description
            );
            for resource in &category.resources {
                println!("    - {}", resource.name);
            }
        }
    }
    Ok(())
}
