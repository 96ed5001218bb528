//! Error types for the probing engine.
//!
//! Every error here is recoverable at some level below the periodic driver:
//! a failed trial is dropped, a failed target is skipped, a failed fetch skips
//! a cycle and a failed write leaves the in-memory snapshot in place.

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

/// Target configuration could not be obtained
#[derive(Debug, Error)]
pub enum ConfigFetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("malformed target configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("target configuration is empty")]
    Empty,
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<ConfigFetchError>,
    },
    #[error("remote configuration source is read-only")]
    ReadOnly,
    #[error("failed to write configuration: {0}")]
    Write(#[from] PersistError),
}

/// A configuration leaf cannot be probed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EndpointError {
    #[error("missing ip")]
    MissingIp,
    #[error("missing port")]
    MissingPort,
    #[error("ip must be a host name or IP literal, got {0}")]
    InvalidIp(serde_json::Value),
    #[error("port must be an integer between 0 and 65535, got {0}")]
    InvalidPort(serde_json::Value),
}

/// Host name could not be turned into an address
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("lookup of {host} failed: {source}")]
    Lookup {
        host: String,
        #[source]
        source: IoError,
    },
    #[error("lookup of {host} returned no addresses")]
    NoAddress { host: String },
}

/// A single connect trial failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect timed out after {0} ms")]
    Timeout(u128),
    #[error("connect failed: {0}")]
    Connect(#[from] IoError),
}

/// Snapshot could not be written to durable storage
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}
