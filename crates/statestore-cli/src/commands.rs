use std::sync::Arc;

use colored::Colorize;
use statestore_core::StateStore;
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::config::SimulationConfig;
use crate::simulate::drone::{self, MissionTiming};
use crate::simulate::{telemetry, RunSummary, Shutdown};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let store = Arc::new(StateStore::new());
    let shutdown = Shutdown::new();
    watch_interrupt(shutdown.clone());

    let summary = match cli.command {
        Command::Telemetry(args) => {
            args.apply(&mut config);
            telemetry::run(store, &config, shutdown).await?
        }
        Command::Drone(args) => {
            args.apply(&mut config);
            let timing = MissionTiming::from_config(&config);
            drone::run(store, &config, timing, shutdown).await?
        }
    };

    report(&summary);
    Ok(())
}

/// Trigger `shutdown` on Ctrl-C.
fn watch_interrupt(shutdown: Shutdown) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupted");
                shutdown.trigger();
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });
}

fn report(summary: &RunSummary) {
    let mark = if summary.failures == 0 {
        "✓".green().bold()
    } else {
        "!".yellow().bold()
    };
    eprintln!(
        "{} {} snapshots, {} updates",
        mark,
        summary.snapshots.to_string().bold(),
        summary.updates.to_string().bold()
    );
    if summary.failures > 0 {
        eprintln!("  {} failed snapshots", summary.failures.to_string().red());
    }
    if summary.completed {
        eprintln!("  {}", "mission complete".green());
    }
}
