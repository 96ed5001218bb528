//! Periodic driver running probing cycles for the lifetime of the process.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::orchestrator::Orchestrator;
use crate::snapshot::SnapshotStore;
use crate::source::{ConfigSource, RetryPolicy};

/// Where the driver currently is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Fetching,
    Probing,
    Published,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Idle => write!(f, "idle"),
            DriverState::Fetching => write!(f, "fetching"),
            DriverState::Probing => write!(f, "probing"),
            DriverState::Published => write!(f, "published"),
        }
    }
}

/// What a single cycle ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A snapshot with `targets` entries was swapped into the store
    Published { targets: usize },
    /// Nothing was published; the previous snapshot stays in place
    Skipped(String),
}

/// Runs the orchestrator on a fixed interval and publishes to the store
pub struct PeriodicDriver {
    source: ConfigSource,
    retry: RetryPolicy,
    orchestrator: Orchestrator,
    store: Arc<SnapshotStore>,
    interval: Duration,
    state: watch::Sender<DriverState>,
}

impl PeriodicDriver {
    pub fn new(
        source: ConfigSource,
        orchestrator: Orchestrator,
        store: Arc<SnapshotStore>,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(DriverState::Idle);
        Self { source, retry: RetryPolicy::default(), orchestrator, store, interval, state }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Receiver following the driver's state transitions
    pub fn subscribe(&self) -> watch::Receiver<DriverState> {
        self.state.subscribe()
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Fetch, probe and publish once
    pub async fn run_once(&self) -> CycleOutcome {
        self.state.send_replace(DriverState::Fetching);
        let config = match self.source.fetch(&self.retry).await {
            Ok(config) => config,
            Err(e) => {
                warn!("No valid configuration found, skipping cycle: {e}");
                self.state.send_replace(DriverState::Idle);
                return CycleOutcome::Skipped(e.to_string());
            }
        };

        self.state.send_replace(DriverState::Probing);
        let snapshot = self.orchestrator.run_cycle(&config).await;
        let targets = snapshot.len();
        let reachable = snapshot.reachable();

        if let Err(e) = self.store.publish(snapshot).await {
            error!("Error saving result file: {e}");
        }
        self.state.send_replace(DriverState::Published);
        info!("Published {targets} results ({reachable} reachable)");

        CycleOutcome::Published { targets }
    }

    /// Loop forever, one cycle per interval
    ///
    /// Every cycle runs in its own task so a panic inside it is reported and
    /// the loop carries on with the next tick.
    pub async fn run(self: Arc<Self>) {
        info!(
            "Starting periodic probing of {} every {}s",
            self.source.describe(),
            self.interval.as_secs()
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let driver = self.clone();
            match tokio::spawn(async move { driver.run_once().await }).await {
                // Outcomes are logged by run_once
                Ok(_) => {}
                Err(e) => error!("Error during periodic tests: {e}"),
            }

            self.state.send_replace(DriverState::Idle);
        }
    }
}
