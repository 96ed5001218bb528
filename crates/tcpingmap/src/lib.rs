//! tcpingmap - TCP connect latency probing engine
//!
//! This library resolves a nested set of targets (region, subregion, operator),
//! measures TCP connect latency to each of them under a bounded worker pool and
//! publishes the averaged results as an immutable snapshot.

pub mod driver;
pub mod error;
pub mod orchestrator;
pub mod prober;
pub mod resolver;
pub mod snapshot;
pub mod source;
pub mod target;

// Re-export main types
pub use driver::{CycleOutcome, DriverState, PeriodicDriver};
pub use error::{ConfigFetchError, EndpointError, PersistError, ProbeError, ResolutionError};
pub use orchestrator::Orchestrator;
pub use prober::{ProbeSettings, Prober, TcpProber};
pub use resolver::{Resolver, SystemResolver};
pub use snapshot::{ProbeResult, Snapshot, SnapshotStore};
pub use source::{Backoff, ConfigSource, RetryPolicy};
pub use target::{Endpoint, ResolvedTarget, TargetConfig, TargetKey};

/// Upper bound on concurrently probed targets
pub const DEFAULT_MAX_WORKERS: usize = 50;

/// Default period between two probing cycles, in seconds
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 120;
