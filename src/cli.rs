//! Command-line interface
//!
//! Runs either a scripted headless scenario or an interactive console on stdin.

use clap::Parser;
use std::path::PathBuf;

/// Behaviour tree and ability casting sandbox
#[derive(Parser, Debug)]
#[command(name = "gameplay_core")]
#[command(about = "Behaviour tree and ability casting sandbox")]
#[command(version)]
pub struct Args {
    /// Run the JSON scenario headlessly and exit
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub headless: Option<PathBuf>,

    /// Set up the interactive console's world from this scenario (its script is ignored)
    #[arg(long, value_name = "SCENARIO_FILE", conflicts_with = "headless")]
    pub scenario: Option<PathBuf>,

    /// Output path for the activity log (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum scenario duration in seconds, overriding the scenario file (headless mode only)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Settings file (RON)
    #[arg(long, value_name = "SETTINGS_FILE")]
    pub settings: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
