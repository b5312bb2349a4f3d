use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::SimulationConfig;

#[derive(Parser)]
#[command(
    name = "statestore",
    about = "Aggregate concurrent telemetry into periodic JSON snapshots",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with simulation settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// High-rate coordinate, battery and event producers
    Telemetry(RunArgs),
    /// Drone mission: upload, flight, and finish events
    Drone(RunArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Milliseconds between snapshots
    #[arg(short, long)]
    pub interval_ms: Option<u64>,
    /// Seconds to run (telemetry) or to fly (drone)
    #[arg(short, long)]
    pub duration: Option<u64>,
    /// Seed for the random producers
    #[arg(long)]
    pub seed: Option<u64>,
    /// Pretty-print each snapshot
    #[arg(long)]
    pub pretty: bool,
}

impl RunArgs {
    /// Overlay command-line flags on top of a loaded configuration.
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(ms) = self.interval_ms {
            config.interval_ms = ms;
        }
        if let Some(secs) = self.duration {
            config.duration_secs = secs;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.pretty {
            config.pretty = true;
        }
    }
}
