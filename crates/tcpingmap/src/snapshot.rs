//! Published results and the store holding the latest of them.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::PersistError;

/// Averaged latency of one target
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Average connect delay in milliseconds, `None` when no trial counted
    #[serde(rename = "average_delay")]
    pub average_delay_ms: Option<f64>,
}

impl ProbeResult {
    pub fn new(average_delay_ms: Option<f64>) -> Self {
        Self { average_delay_ms }
    }

    /// Result of a target that produced no usable sample
    pub fn no_data() -> Self {
        Self { average_delay_ms: None }
    }
}

/// Results of one cycle keyed by display key, e.g. `East-CityA (ISP1)`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, ProbeResult>);

impl Snapshot {
    pub fn new(results: BTreeMap<String, ProbeResult>) -> Self {
        Self(results)
    }

    pub fn get(&self, key: &str) -> Option<&ProbeResult> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProbeResult)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries carrying an average
    pub fn reachable(&self) -> usize {
        self.0.values().filter(|result| result.average_delay_ms.is_some()).count()
    }
}

impl FromIterator<(String, ProbeResult)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, ProbeResult)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Holds the latest published snapshot and mirrors it to disk
///
/// The in-memory slot is swapped as a whole, so readers observe either the
/// previous snapshot or the new one and never a mix.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: ArcSwapOption<Snapshot>,
    result_path: Option<PathBuf>,
}

impl SnapshotStore {
    /// Store that keeps results in memory only
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Store that also persists every published snapshot to `path`
    pub fn with_result_path(path: impl Into<PathBuf>) -> Self {
        Self { latest: ArcSwapOption::empty(), result_path: Some(path.into()) }
    }

    pub fn result_path(&self) -> Option<&Path> {
        self.result_path.as_deref()
    }

    /// Latest snapshot, `None` until the first publish
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.latest.load_full()
    }

    /// Swap `snapshot` in and persist it
    ///
    /// The in-memory value is replaced before writing, so a persistence
    /// error leaves live reads on the new snapshot.
    pub async fn publish(&self, snapshot: Snapshot) -> Result<(), PersistError> {
        let snapshot = Arc::new(snapshot);
        self.latest.store(Some(snapshot.clone()));

        if let Some(path) = &self.result_path {
            let body = serde_json::to_vec_pretty(snapshot.as_ref())?;
            write_atomic(path, &body).await?;
            info!("Successfully saved results to {}", path.display());
        }
        Ok(())
    }
}

/// Write `body` to a fresh temporary file beside `path`, sync it and rename
/// it into place
///
/// Every call gets its own temporary file, so concurrent writers never see
/// each other's partial output; the last rename wins.
pub async fn write_atomic(path: &Path, body: &[u8]) -> Result<(), PersistError> {
    let target = path.to_path_buf();
    let body = body.to_vec();

    tokio::task::spawn_blocking(move || write_atomic_blocking(&target, &body))
        .await
        .map_err(|e| PersistError::Io { path: path.to_path_buf(), source: io::Error::other(e) })?
}

fn write_atomic_blocking(path: &Path, body: &[u8]) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io { path: path.to_path_buf(), source };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(body).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
