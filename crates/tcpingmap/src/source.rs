//! Target configuration sources.
//!
//! Configuration is fetched fresh every cycle, either from a remote URL or from
//! a local JSON file, under an explicit retry policy.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::ConfigFetchError;
use crate::snapshot::write_atomic;
use crate::target::TargetConfig;

/// Delay growth between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay doubles after every failed attempt
    Exponential,
}

/// Bounded retry policy for configuration fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(5), backoff: Backoff::Fixed }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, delay: Duration::ZERO, backoff: Backoff::Fixed }
    }

    /// Delay to wait after the failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                self.delay.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            }
        }
    }
}

/// Where the target configuration comes from
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Remote { url: String, client: reqwest::Client },
    Local { path: PathBuf },
}

impl ConfigSource {
    /// Remote source fetched over HTTP with the given request timeout
    pub fn remote(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tcpingmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::Remote { url: url.into(), client })
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Human readable location, for logs
    pub fn describe(&self) -> String {
        match self {
            Self::Remote { url, .. } => url.clone(),
            Self::Local { path } => path.display().to_string(),
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// Fetch and parse the configuration, retrying per `policy`
    pub async fn fetch(&self, policy: &RetryPolicy) -> Result<TargetConfig, ConfigFetchError> {
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_once().await {
                Ok(config) => {
                    info!("Successfully loaded target config from {}", self.describe());
                    return Ok(config);
                }
                // Retrying does not change an empty or malformed document
                Err(e @ (ConfigFetchError::Empty | ConfigFetchError::Parse(_))) => return Err(e),
                Err(e) if attempt >= attempts => {
                    return Err(ConfigFetchError::Exhausted { attempts, last: Box::new(e) });
                }
                Err(e) => {
                    warn!("Attempt {attempt} to load {} failed: {e}", self.describe());
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fetch_once(&self) -> Result<TargetConfig, ConfigFetchError> {
        let raw = match self {
            Self::Remote { url, client } => {
                let request_err = |source| ConfigFetchError::Request { url: url.clone(), source };
                let response = client.get(url).send().await.map_err(request_err)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ConfigFetchError::Status { url: url.clone(), status: status.as_u16() });
                }
                response.text().await.map_err(request_err)?
            }
            Self::Local { path } => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigFetchError::Read { path: path.clone(), source })?,
        };

        let config = TargetConfig::from_json(&raw)?;
        if config.is_empty() {
            return Err(ConfigFetchError::Empty);
        }
        Ok(config)
    }

    /// Replace the configuration of a local source
    pub async fn store(&self, config: &TargetConfig) -> Result<(), ConfigFetchError> {
        let Self::Local { path } = self else {
            return Err(ConfigFetchError::ReadOnly);
        };

        let body = serde_json::to_vec_pretty(config)?;
        write_atomic(path, &body).await?;
        info!("Stored target config to {}", path.display());
        Ok(())
    }
}
