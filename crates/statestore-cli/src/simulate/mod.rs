//! Sample producers and the periodic snapshot consumer.
//!
//! Producers run as tokio tasks and only see the write side of the store
//! ([`StateSink`](statestore_core::StateSink)). The consumer owns the read
//! side: it takes a snapshot on every tick, encodes it as JSON and prints one
//! document per snapshot on stdout.

pub mod drone;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use statestore_core::{Snapshot, StateStore};
use tokio::sync::watch;
use tokio::time::{sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;

/// Cloneable stop signal shared by producers and the consumer.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            debug!("shutdown sender dropped");
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Call `tick` every `period` until `shutdown` fires.
pub async fn every<F>(period: Duration, shutdown: &Shutdown, mut tick: F)
where
    F: FnMut(),
{
    while !shutdown.is_triggered() {
        tick();
        tokio::select! {
            _ = sleep(period) => {}
            _ = shutdown.wait() => break,
        }
    }
}

/// Sleep for `period`; `false` if shutdown fired first.
pub async fn pause(period: Duration, shutdown: &Shutdown) -> bool {
    tokio::select! {
        _ = sleep(period) => true,
        _ = shutdown.wait() => false,
    }
}

/// Independent RNG stream per producer, reproducible when seeded.
pub fn producer_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

/// Encode a snapshot as a JSON document.
pub fn render(snapshot: &Snapshot, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(snapshot)
    } else {
        serde_json::to_string(snapshot)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConsumerOptions {
    pub interval: Duration,
    /// Stop after this long; `None` runs until shutdown or the stop condition.
    pub deadline: Option<Duration>,
    pub pretty: bool,
}

impl ConsumerOptions {
    pub fn new(config: &SimulationConfig, deadline: Option<Duration>) -> Self {
        Self {
            interval: config.interval(),
            deadline,
            pretty: config.pretty,
        }
    }
}

/// What the consumer saw over a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub snapshots: u64,
    pub updates: u64,
    pub failures: u64,
    /// The stop condition matched (as opposed to deadline or interrupt).
    pub completed: bool,
}

/// Snapshot `store` on every tick until the deadline, shutdown, or
/// `stop_when` returns `true` for an emitted snapshot.
///
/// Triggers `shutdown` on exit so producers wind down with it.
pub async fn consume(
    store: Arc<StateStore>,
    options: ConsumerOptions,
    shutdown: Shutdown,
    stop_when: fn(&Snapshot) -> bool,
) -> anyhow::Result<RunSummary> {
    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = async {
        match options.deadline {
            Some(after) => sleep(after).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut summary = RunSummary::default();
    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = match store.snapshot() {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!(error = %e, "snapshot failed");
                        summary.failures += 1;
                        continue;
                    }
                };
                summary.snapshots += 1;
                summary.updates += snapshot.updates();
                match render(&snapshot, options.pretty) {
                    Ok(json) => println!("{json}"),
                    Err(e) => break Err(e.into()),
                }
                if stop_when(&snapshot) {
                    info!(snapshots = summary.snapshots, "stop condition reached");
                    summary.completed = true;
                    break Ok(());
                }
            }
            _ = &mut deadline => {
                debug!("run time elapsed");
                break Ok(());
            }
            _ = shutdown.wait() => break Ok(()),
        }
    };

    shutdown.trigger();
    result.map(|()| summary)
}
