//! respcheck CLI - check captured API responses against an OpenAPI contract

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use respcheck_core::config::DEFAULT_CONFIG_FILES;
use respcheck_core::{Config, RowResult};
use respcheck_runner::{ContractRunner, RunOutput, RunnerError};

#[derive(Parser)]
#[command(name = "respcheck")]
#[command(about = "Check captured API responses against an OpenAPI contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Log filter (e.g. "debug", "respcheck_runner=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare fixtures against the contract and write reports
    Check {
        /// Config file (default: .respcheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Contract directory (overrides config)
        #[arg(long)]
        contract_dir: Option<PathBuf>,

        /// Fixture directory (overrides config)
        #[arg(long)]
        fixture_dir: Option<PathBuf>,

        /// HTML report path (overrides config)
        #[arg(long)]
        html: Option<PathBuf>,

        /// CSV report path (overrides config)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Show coverage plan without comparing bodies
        #[arg(long)]
        dry_run: bool,
    },

    /// Initialize config file
    Init,

    /// Check config, contract and fixture paths
    Doctor,

    /// Export JSON Schema for the JSON report
    Schema,

    /// Show usage guide (config, fixture format, reports, CI integration)
    Guide,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    })
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check {
            config,
            contract_dir,
            fixture_dir,
            html,
            csv,
            dry_run,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if let Some(dir) = contract_dir {
                cfg.contract_dir = dir;
            }
            if let Some(dir) = fixture_dir {
                cfg.fixture_dir = dir;
            }
            if let Some(path) = html {
                cfg.html_path = Some(path);
            }
            if let Some(path) = csv {
                cfg.csv_path = Some(path);
            }

            let runner = ContractRunner::from_config(&cfg);

            // Dry run: show plan and exit
            if dry_run {
                let plan = runner.plan();
                match cli.output {
                    OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Silent => {}
                }
                return Ok(if plan.has_errors() { 1 } else { 0 });
            }

            if cli.output == OutputFormat::Terminal {
                eprintln!("Config:");
                eprintln!("  contract: {}", cfg.contract_path().display());
                eprintln!("  fixtures: {}", cfg.fixture_dir.display());
                eprintln!();
            }

            let output = match runner.run() {
                Ok(output) => output,
                Err(RunnerError::NoFixtures(dir)) => {
                    eprintln!("Error: No valid fixtures under {dir}. Check fixture_dir.");
                    return Ok(3);
                }
                Err(e) => return Err(e.into()),
            };

            if !output.errors.is_empty() && cli.output != OutputFormat::Silent {
                eprintln!("Errors:");
                for err in &output.errors {
                    eprintln!("  - {err}");
                }
                eprintln!();
            }

            match cli.output {
                OutputFormat::Terminal => print_terminal(&output),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&output.report())?);
                }
                OutputFormat::Silent => {}
            }

            let written = runner.write_reports(&output)?;
            if cli.output == OutputFormat::Terminal {
                for path in &written {
                    eprintln!("Report saved: {}", path.display());
                }
            }

            Ok(output.exit_code())
        }

        Commands::Init => {
            let config_path = DEFAULT_CONFIG_FILES[0];
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - contract_dir: directory holding swagger.yaml");
            println!("  - fixture_dir: captured responses, one directory per operation");
            println!("  - html_path / csv_path: report destinations");
            Ok(0)
        }

        Commands::Doctor => {
            println!("respcheck doctor");
            println!("================\n");

            match DEFAULT_CONFIG_FILES.iter().find(|name| Path::new(name).exists()) {
                Some(name) => println!("[OK] Config file ({name})"),
                None => {
                    println!("[--] Config file (none found, using defaults)");
                    println!("     Create one with: respcheck init");
                }
            }
            let cfg = Config::load_default()?;

            let plan = ContractRunner::from_config(&cfg).plan();
            for v in &plan.validations {
                println!("[{}] {}", v.status, v.message);
            }

            if plan.has_errors() {
                println!("\nFix the errors above, then run: respcheck check");
                Ok(1)
            } else {
                if plan.has_warnings() {
                    println!("\nWarnings above do not block a run.");
                }
                println!(
                    "\nReady: {} contract entries, {} fixtures",
                    plan.contract_entries, plan.fixtures_loaded
                );
                Ok(0)
            }
        }

        Commands::Schema => {
            let schema = respcheck_core::report::generate_schema();
            println!("{schema}");
            Ok(0)
        }

        Commands::Guide => {
            print!("{}", include_str!("../docs/GUIDE.md"));
            Ok(0)
        }
    }
}

fn print_terminal(output: &RunOutput) {
    for group in &output.groups {
        println!("{}", group.api);
        for row in &group.rows {
            println!("  [{}] {} {} ({})", row.result, row.status, row.test_case, row.fixture_file);
            if row.result == RowResult::Fail {
                for description in &row.descriptions {
                    println!("         {description}");
                }
            }
        }
    }

    let summary = &output.summary;
    let verdict = if summary.failed == 0 { "PASS" } else { "FAIL" };
    println!(
        "\n{verdict}: {} fixtures, {} passed, {} failed",
        summary.fixtures, summary.passed, summary.failed
    );
    if summary.skipped > 0 {
        println!("  Skipped: {}", summary.skipped);
        for skipped in &output.skipped {
            println!("    {}: {}", skipped.path, skipped.reason);
        }
    }
    println!("  Exit code: {}", output.exit_code());
}
