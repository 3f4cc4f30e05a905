use crate::device::{DevicePoller, PollPhase};
use crate::records::RecordStore;
use crate::state::Shared;
use crate::traffic::{ControlMode, TrafficLevel, TrafficPanel};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{self, JoinHandle};

#[derive(Debug, Serialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub records_loaded: usize,
    pub violation_queries: u64,
    pub device_connected: bool,
    pub poller_phase: PollPhase,
    pub polls_completed: u64,
    pub polls_discarded: u64,
    pub traffic_level: TrafficLevel,
    pub control_mode: ControlMode,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    violation_queries: Arc<AtomicU64>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            violation_queries: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_violation_query(&self) {
        self.violation_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_health(
        &self,
        store: &RecordStore,
        poller: &DevicePoller,
        traffic: &Shared<TrafficPanel>,
    ) -> KernelHealth {
        let poll = poller.snapshot();
        let panel = *traffic.lock();
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            records_loaded: store.len(),
            violation_queries: self.violation_queries.load(Ordering::Relaxed),
            device_connected: poll.status.connected,
            poller_phase: poll.phase,
            polls_completed: poll.polls_completed,
            polls_discarded: poll.polls_discarded,
            traffic_level: panel.level(),
            control_mode: panel.mode(),
        }
    }

    /// Rapport périodique de santé dans les logs ; intervalle nul = désactivé
    pub fn spawn_health_reporter(
        &self,
        every: Duration,
        store: RecordStore,
        poller: DevicePoller,
        traffic: Shared<TrafficPanel>,
    ) -> Option<JoinHandle<()>> {
        if every.is_zero() {
            return None;
        }
        let tracker = self.clone();
        Some(task::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // premier tick immédiat
            loop {
                interval.tick().await;
                let health = tracker.get_health(&store, &poller, &traffic);
                tracing::info!(
                    "[health] uptime {}s, device {}, {} queries, traffic {:?}",
                    health.uptime_seconds,
                    if health.device_connected { "online" } else { "offline" },
                    health.violation_queries,
                    health.traffic_level
                );
            }
        }))
    }
}
