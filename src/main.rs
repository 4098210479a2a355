mod calibrate;
mod cli;
mod config;
mod error;
mod eval;
mod model;
mod runner;
mod tools;
mod types;

use crate::error::QscoreError;
use clap::Parser;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const MODEL_REJECTED: i32 = 2;
    pub const RUNTIME_FAILURE: i32 = 3;
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<i32, QscoreError> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        cli::Commands::Assess(cmd) => {
            if !cmd.path.exists() {
                return Err(QscoreError::Configuration(format!(
                    "project path does not exist: {}",
                    cmd.path.display()
                )));
            }

            let run_config = config::load_config(&cmd.config)?;
            let registry = eval::registry::StrategyRegistry::with_builtins();
            let assessment = runner::assess_project(
                &cmd.path,
                &cmd.output,
                &cmd.model,
                &run_config,
                &registry,
            )?;

            println!("overall score: {:.4}", assessment.score);
            println!("evaluation file: {}", assessment.export_path.display());
            Ok(exit_code::SUCCESS)
        }
        cli::Commands::Calibrate(cmd) => {
            if !cmd.path.exists() {
                return Err(QscoreError::Configuration(format!(
                    "corpus path does not exist: {}",
                    cmd.path.display()
                )));
            }

            let run_config = config::load_config(&cmd.config)?;
            let registry = eval::registry::StrategyRegistry::with_builtins();
            let calibration = calibrate::engine::run_calibration(
                &cmd.path,
                &cmd.project_flag,
                &cmd.model,
                &run_config,
                &registry,
                &cmd.output,
            )?;

            println!("benchmark projects: {}", calibration.projects);
            println!("measures calibrated: {}", calibration.thresholds.len());
            println!("matrix file: {}", calibration.matrix_path.display());
            println!("calibrated model: {}", calibration.model_path.display());
            Ok(exit_code::SUCCESS)
        }
    }
}

fn main() {
    match run() {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            let code = match e {
                QscoreError::Configuration(_) | QscoreError::Validation(_) => {
                    exit_code::MODEL_REJECTED
                }
                _ => exit_code::RUNTIME_FAILURE,
            };
            std::process::exit(code);
        }
    }
}
