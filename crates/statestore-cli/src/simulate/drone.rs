//! Drone mission: upload progress, a timed flight, and a finish event.
//!
//! The consumer stops on its own after emitting the snapshot that carries
//! `missionfinish`.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use statestore_core::{AttributeValue, Snapshot, StateSink, StateStore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::telemetry::{START_LAT, START_LNG};
use super::{consume, every, pause, producer_rng, ConsumerOptions, RunSummary, Shutdown};
use crate::config::SimulationConfig;

const RANDOM_EVENTS: [&str; 2] = ["droneconnectionlost", "dronestoragefull"];

/// Mission length used when no duration is configured.
pub const DEFAULT_FLIGHT: Duration = Duration::from_secs(120);

/// Phase lengths of the mission script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MissionTiming {
    pub upload_steps: u32,
    pub upload_step: Duration,
    /// Wait between upload completion and mission start.
    pub pre_start: Duration,
    pub flight: Duration,
    /// Wait between landing and the finish event.
    pub landing: Duration,
    pub error_period: Duration,
}

impl MissionTiming {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            upload_steps: 100,
            upload_step: Duration::from_millis(30),
            pre_start: Duration::from_secs(1),
            flight: config.duration().unwrap_or(DEFAULT_FLIGHT),
            landing: Duration::from_secs(2),
            error_period: Duration::from_secs(30),
        }
    }
}

/// `true` once the mission sequence reports `missionfinish`.
pub fn mission_finished(snapshot: &Snapshot) -> bool {
    snapshot
        .get("mission")
        .and_then(AttributeValue::as_sequence)
        .is_some_and(|events| events.iter().any(|e| e == "missionfinish"))
}

/// Run the mission and print snapshots until it finishes or `shutdown` fires.
pub async fn run(
    store: Arc<StateStore>,
    config: &SimulationConfig,
    timing: MissionTiming,
    shutdown: Shutdown,
) -> anyhow::Result<RunSummary> {
    let consumer = tokio::spawn(consume(
        Arc::clone(&store),
        ConsumerOptions::new(config, None),
        shutdown.clone(),
        mission_finished,
    ));

    let sink: Arc<dyn StateSink> = store;
    fly_mission(sink, config.seed, timing, &shutdown).await;

    consumer.await?
}

async fn fly_mission(
    sink: Arc<dyn StateSink>,
    seed: Option<u64>,
    timing: MissionTiming,
    shutdown: &Shutdown,
) {
    for progress in 1..=timing.upload_steps {
        sink.set("missionuploadprogress", AttributeValue::from(progress));
        if !pause(timing.upload_step, shutdown).await {
            return;
        }
    }
    if !pause(timing.pre_start, shutdown).await {
        return;
    }

    sink.add_to_list("mission", "missionstart");
    // Upload progress is meaningless once the mission runs.
    sink.remove("missionuploadprogress");
    info!(flight_ms = timing.flight.as_millis() as u64, "mission started");

    let flying = Shutdown::new();
    let producers = spawn_flight_producers(&sink, seed, timing, &flying);
    let landed = pause(timing.flight, shutdown).await;
    flying.trigger();
    for producer in producers {
        if let Err(e) = producer.await {
            warn!(error = %e, "flight producer failed");
        }
    }

    if landed && pause(timing.landing, shutdown).await {
        sink.add_to_list("mission", "missionfinish");
        info!("mission finished");
    }
}

fn spawn_flight_producers(
    sink: &Arc<dyn StateSink>,
    seed: Option<u64>,
    timing: MissionTiming,
    flying: &Shutdown,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(6);

    {
        let sink = Arc::clone(sink);
        let flying = flying.clone();
        let mut rng = producer_rng(seed, 10);
        let (mut lat, mut lng) = (START_LAT, START_LNG);
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(50), &flying, move || {
                lat += rng.gen::<f64>() * 0.0001;
                lng += rng.gen::<f64>() * 0.0001;
                sink.set("location", AttributeValue::mapping([("lat", lat), ("lng", lng)]));
            })
            .await;
        }));
    }

    // Slow-moving gauges, all sampled twice a second.
    for (stream, name, start, drift) in [
        (11, "windlevel", 1.0, 0.0001),
        (12, "gpssignallevel", 92.0, 0.0001),
        (13, "batterylevel", 100.0, -0.0001),
    ] {
        let sink = Arc::clone(sink);
        let flying = flying.clone();
        let mut rng = producer_rng(seed, stream);
        let mut level: f64 = start;
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(500), &flying, move || {
                sink.set(name, AttributeValue::Real(level));
                level += if drift < 0.0 { drift } else { rng.gen::<f64>() * drift };
            })
            .await;
        }));
    }

    {
        let sink = Arc::clone(sink);
        let flying = flying.clone();
        handles.push(tokio::spawn(async move {
            every(timing.error_period, &flying, move || {
                sink.add_to_list("mission", "missionerror");
            })
            .await;
        }));
    }

    {
        let sink = Arc::clone(sink);
        let flying = flying.clone();
        let mut rng = producer_rng(seed, 14);
        handles.push(tokio::spawn(async move {
            every(Duration::from_millis(500), &flying, move || {
                let event = RANDOM_EVENTS[rng.gen_range(0..RANDOM_EVENTS.len())];
                sink.add_to_set("events", event);
            })
            .await;
        }));
    }

    handles
}
