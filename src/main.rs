//! Command-line driver for the scheduling DSL.
//!
//! Run with: cargo run -- solve roster.json

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use shiftplan::demo_data::{self, DemoData};
use shiftplan::{solve, validate, Spec};

#[derive(Parser)]
#[command(name = "shiftplan", about = "Workforce scheduling DSL compiler and solver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Statically check a spec and print the validation report
    Validate {
        /// Path to the spec JSON file
        spec: PathBuf,
    },

    /// Validate, compile, and solve a spec, printing the schedule
    Solve {
        /// Path to the spec JSON file
        spec: PathBuf,
        /// Solver wall-clock budget in seconds
        #[arg(long, default_value_t = 15.0)]
        max_time: f64,
        /// Requested search workers (backend may search single-threaded)
        #[arg(long, default_value_t = 8)]
        workers: usize,
    },

    /// Print a generated demo spec
    Demo {
        /// Demo size: small or large
        #[arg(default_value = "small")]
        size: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Validate { spec } => {
            let spec = load_spec(&spec)?;
            let report = validate(&spec);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }

        Commands::Solve { spec, max_time, workers } => {
            let spec = load_spec(&spec)?;
            let report = validate(&spec);
            if !report.ok {
                eprintln!("spec invalid:\n{}", serde_json::to_string_pretty(&report)?);
                return Ok(ExitCode::FAILURE);
            }
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }

            let outcome = solve(&spec, max_time, workers)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Demo { size } => {
            let demo: DemoData = size
                .parse()
                .map_err(|_| format!("unknown demo size '{size}' (expected small or large)"))?;
            let spec = demo_data::generate(demo);
            println!("{}", serde_json::to_string_pretty(&spec)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_spec(path: &PathBuf) -> Result<Spec, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let spec = serde_json::from_str(&raw)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(spec)
}
