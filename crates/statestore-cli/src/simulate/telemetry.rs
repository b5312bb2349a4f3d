//! Continuous telemetry: hundreds of writes per second from four producers.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use statestore_core::{AttributeValue, StateSink, StateStore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{consume, every, producer_rng, ConsumerOptions, RunSummary, Shutdown};
use crate::config::SimulationConfig;

// Campinas, Parque Rural Fazenda Santa Cândida.
pub const START_LAT: f64 = -22.842830;
pub const START_LNG: f64 = -47.035735;
pub const START_ALT: f64 = 300.0;

/// Start the coordinate, battery, event, and mission producers.
pub fn spawn_producers(
    sink: Arc<dyn StateSink>,
    seed: Option<u64>,
    shutdown: &Shutdown,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(4);

    // ~250 writes/s
    {
        let sink = Arc::clone(&sink);
        let shutdown = shutdown.clone();
        let mut rng = producer_rng(seed, 0);
        let (mut lat, mut lng, mut alt) = (START_LAT, START_LNG, START_ALT);
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(4), &shutdown, move || {
                lat += rng.gen::<f64>() * 0.0001;
                lng += rng.gen::<f64>() * 0.0001;
                alt += -0.001 + rng.gen::<f64>() * 0.002;
                sink.set(
                    "coord",
                    AttributeValue::mapping([("alt", alt), ("lat", lat), ("lng", lng)]),
                );
            })
            .await;
        }));
    }

    // ~110 writes/s
    {
        let sink = Arc::clone(&sink);
        let shutdown = shutdown.clone();
        let mut level = 100.0_f64;
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(9), &shutdown, move || {
                sink.set("battery", AttributeValue::Real(level));
                level -= 0.00001;
            })
            .await;
        }));
    }

    // ~20 writes/s over a small vocabulary, so the set deduplicates
    {
        let sink = Arc::clone(&sink);
        let shutdown = shutdown.clone();
        let mut rng = producer_rng(seed, 1);
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(45), &shutdown, move || {
                let n: u8 = rng.gen_range(0..20);
                sink.add_to_set("event", &format!("random event #{n}"));
            })
            .await;
        }));
    }

    // 2 writes/s
    {
        let shutdown = shutdown.clone();
        let mut id = 0u64;
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(500), &shutdown, move || {
                id += 1;
                sink.add_to_list("mission", &format!("mission event #{id}"));
            })
            .await;
        }));
    }

    handles
}

/// Run the telemetry sample until the configured duration or `shutdown`.
pub async fn run(
    store: Arc<StateStore>,
    config: &SimulationConfig,
    shutdown: Shutdown,
) -> anyhow::Result<RunSummary> {
    let sink: Arc<dyn StateSink> = store.clone();
    let producers = spawn_producers(sink, config.seed, &shutdown);
    info!(
        producers = producers.len(),
        interval_ms = config.interval_ms,
        "telemetry started"
    );

    let options = ConsumerOptions::new(config, config.duration());
    let result = consume(store, options, shutdown.clone(), |_| false).await;

    shutdown.trigger();
    for producer in producers {
        if let Err(e) = producer.await {
            warn!(error = %e, "producer task failed");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn producers_fill_the_store() {
        let store = Arc::new(StateStore::new());
        let shutdown = Shutdown::new();
        let sink: Arc<dyn StateSink> = store.clone();
        let producers = spawn_producers(sink, Some(1), &shutdown);

        tokio::time::sleep(Duration::from_millis(120)).await;
        shutdown.trigger();
        for p in producers {
            p.await.unwrap();
        }

        let snap = store.snapshot().unwrap();
        let coord = snap.get("coord").and_then(AttributeValue::as_mapping).unwrap();
        let keys: Vec<&str> = coord.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["alt", "lat", "lng"]);
        assert!(coord["lat"].as_real().unwrap() >= START_LAT);

        assert!(snap.get("battery").and_then(AttributeValue::as_real).unwrap() <= 100.0);
        let events = snap.get("event").and_then(AttributeValue::as_set).unwrap();
        assert!(!events.is_empty() && events.len() <= 20);
        let mission = snap.get("mission").and_then(AttributeValue::as_sequence).unwrap();
        assert_eq!(mission[0], "mission event #1");
        assert!(snap.updates() > 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn run_stops_on_shutdown() {
        let store = Arc::new(StateStore::new());
        let shutdown = Shutdown::new();
        let config = SimulationConfig {
            interval_ms: 20,
            duration_secs: 0,
            seed: Some(9),
            pretty: false,
        };

        let stopper = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                shutdown.trigger();
            })
        };

        let summary = run(Arc::clone(&store), &config, shutdown).await.unwrap();
        stopper.await.unwrap();

        assert!(!summary.completed);
        assert!(summary.snapshots >= 2);
        assert!(summary.updates > 0);
        assert_eq!(summary.failures, 0);
        assert!(store.contains("battery"));
    }
}
