use std::sync::Arc;

use tcpingmap::{
    ConfigSource, Orchestrator, PeriodicDriver, SnapshotStore, SystemResolver, TcpProber,
};

use crate::config::{self, Config};

/// Shared with every HTTP worker
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub source: ConfigSource,
}

impl AppState {
    pub fn new(store: Arc<SnapshotStore>, source: ConfigSource) -> Self {
        Self { store, source }
    }
}

/// Wire the store, the orchestrator and the driver from the server config
pub fn build(config: &Config) -> Result<(AppState, Arc<PeriodicDriver>), config::Error> {
    let source = config.config_source()?;
    let store = Arc::new(SnapshotStore::with_result_path(config.storage.result_path.clone()));

    let orchestrator = Orchestrator::new(
        Arc::new(SystemResolver::new()),
        Arc::new(TcpProber::new(config.probe_settings())),
    )
    .with_max_workers(config.probe.max_workers);

    let driver = PeriodicDriver::new(
        source.clone(),
        orchestrator,
        store.clone(),
        config.cycle_interval(),
    )
    .with_retry_policy(config.retry_policy());

    Ok((AppState::new(store, source), Arc::new(driver)))
}
