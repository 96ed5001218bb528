//! Cycle orchestration.
//!
//! One cycle flattens the target configuration, resolves every leaf, probes
//! the resolved targets under a bounded worker pool and assembles the results
//! into a [`Snapshot`]. Failures of single targets never abort the cycle.

use std::collections::{BTreeMap, HashSet};
use std::collections::btree_map::Entry;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, stream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::DEFAULT_MAX_WORKERS;
use crate::prober::Prober;
use crate::resolver::Resolver;
use crate::snapshot::{ProbeResult, Snapshot};
use crate::target::{ResolvedTarget, TargetConfig, TargetKey};

/// Runs probing cycles over a target configuration
#[derive(Clone)]
pub struct Orchestrator {
    resolver: Arc<dyn Resolver>,
    prober: Arc<dyn Prober>,
    max_workers: usize,
}

impl Orchestrator {
    pub fn new(resolver: Arc<dyn Resolver>, prober: Arc<dyn Prober>) -> Self {
        Self { resolver, prober, max_workers: DEFAULT_MAX_WORKERS }
    }

    /// Cap on probes in flight at the same time
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run a full cycle and return its snapshot
    pub async fn run_cycle(&self, config: &TargetConfig) -> Snapshot {
        let targets = self.resolve_targets(config).await;
        if targets.is_empty() {
            warn!("No targets resolved. Publishing an empty snapshot.");
            return Snapshot::default();
        }

        let results = self.execute_probes(targets).await;
        build_snapshot(results)
    }

    /// Flatten the configuration and resolve each leaf
    ///
    /// Leaves with a missing or malformed host or port and leaves whose host
    /// fails to resolve are logged and dropped.
    pub async fn resolve_targets(&self, config: &TargetConfig) -> Vec<ResolvedTarget> {
        let pending: Vec<(TargetKey, String, u16)> = config
            .leaves()
            .filter_map(|(key, endpoint)| match endpoint.target() {
                Ok((host, port)) => Some((key, host.to_string(), port)),
                Err(e) => {
                    warn!("Skipping {key}: {e}");
                    None
                }
            })
            .collect();

        stream::iter(pending)
            .map(|(key, host, port)| async move {
                match self.resolver.resolve(&host).await {
                    Ok(ip) => Some(ResolvedTarget { key, ip, port }),
                    Err(e) => {
                        warn!("Failed to resolve IP for {key}: {e}");
                        None
                    }
                }
            })
            .buffered(self.max_workers)
            .filter_map(|resolved| async move { resolved })
            .collect()
            .await
    }

    /// Probe every target with at most `min(targets, max_workers)` in flight
    ///
    /// Results come back in completion order. A probe that panics reports no
    /// data for its target.
    pub async fn execute_probes(
        &self,
        targets: Vec<ResolvedTarget>,
    ) -> Vec<(TargetKey, ProbeResult)> {
        let workers = targets.len().min(self.max_workers).max(1);
        info!("Using {workers} workers for concurrent testing.");

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut results = Vec::with_capacity(targets.len());
        let mut outstanding = HashSet::with_capacity(targets.len());

        for target in targets {
            outstanding.insert(target.key.clone());
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                error!("Worker pool closed, skipping {}", target.key);
                continue;
            };
            let prober = self.prober.clone();

            tasks.spawn(async move {
                let probe = AssertUnwindSafe(prober.probe(target.ip, target.port));
                let result = probe.catch_unwind().await.unwrap_or_else(|_| {
                    error!("Probe of {} panicked", target.key);
                    ProbeResult::no_data()
                });
                drop(permit);
                (target, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((target, result)) => {
                    let delay = result
                        .average_delay_ms
                        .map_or_else(|| "N/A".to_string(), |delay| format!("{delay}ms"));
                    info!("Ping result for {} (IP: {}): {delay}", target.key, target.ip);
                    outstanding.remove(&target.key);
                    results.push((target.key, result));
                }
                Err(e) => error!("Probe task failed: {e}"),
            }
        }

        results.extend(no_data_for(outstanding));
        results
    }
}

/// No-data results for targets whose task never reported back
fn no_data_for(keys: HashSet<TargetKey>) -> impl Iterator<Item = (TargetKey, ProbeResult)> {
    keys.into_iter().map(|key| {
        warn!("No result for {key}, reporting no data");
        (key, ProbeResult::no_data())
    })
}

/// Rename results to display keys
///
/// Distinct keys can render to the same display key when a name contains the
/// separator; the first key in key order wins and the collision is logged.
pub fn build_snapshot(mut results: Vec<(TargetKey, ProbeResult)>) -> Snapshot {
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut flat = BTreeMap::new();
    for (key, result) in results {
        match flat.entry(key.display_key()) {
            Entry::Vacant(slot) => {
                slot.insert(result);
            }
            Entry::Occupied(slot) => {
                warn!("Result of {key} collides with display key {:?}, dropping it", slot.key());
            }
        }
    }

    Snapshot::new(flat)
}
