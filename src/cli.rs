use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "qscore",
    version,
    about = "Quality-model evaluation and calibration over static-analysis findings"
)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a single project against a quality model
    Assess(AssessCommand),
    /// Derive thresholds and weights from a benchmark corpus
    Calibrate(CalibrateCommand),
}

#[derive(Args)]
pub struct AssessCommand {
    /// Root directory of the project to evaluate
    pub path: PathBuf,

    /// Quality model description file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Run configuration declaring the tool adapters
    #[arg(short, long, default_value = "qscore.toml")]
    pub config: PathBuf,

    /// Directory to place evaluation results in
    #[arg(short, long, default_value = "qscore-out")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct CalibrateCommand {
    /// Root directory of the benchmark corpus
    pub path: PathBuf,

    /// Quality model description file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Run configuration declaring the tool adapters
    #[arg(short, long, default_value = "qscore.toml")]
    pub config: PathBuf,

    /// Filename suffix marking a benchmark project root, e.g. ".csproj"
    #[arg(short = 'f', long)]
    pub project_flag: String,

    /// Directory to place the matrix and calibrated model in
    #[arg(short, long, default_value = "qscore-out")]
    pub output: PathBuf,
}
