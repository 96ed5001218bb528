//! TCP connect latency prober.
//!
//! A probe runs a fixed number of sequential connect trials against one
//! address and reduces the retained samples to a rounded average.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::ProbeError;
use crate::snapshot::ProbeResult;

/// Prober trait for measuring latency to one address
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `(ip, port)` and return the averaged delay, if any
    async fn probe(&self, ip: IpAddr, port: u16) -> ProbeResult;
}

/// Tunables for a TCP probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    /// Timeout of a single connect attempt
    pub timeout: Duration,

    /// Number of sequential connect attempts
    pub trials: u32,

    /// Samples above this delay are discarded as noise
    pub max_delay_ms: f64,

    /// Pause between two attempts
    pub spacing: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            trials: 3,
            max_delay_ms: 500.0,
            spacing: Duration::from_secs(1),
        }
    }
}

impl ProbeSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_max_delay_ms(mut self, max_delay_ms: f64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }
}

/// Prober performing real TCP connects
#[derive(Debug, Clone, Default)]
pub struct TcpProber {
    settings: ProbeSettings,
}

impl TcpProber {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// One connect attempt, returning the elapsed time in milliseconds
    async fn connect_once(&self, addr: SocketAddr) -> Result<f64, ProbeError> {
        let start = Instant::now();

        let stream = timeout(self.settings.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ProbeError::Timeout(self.settings.timeout.as_millis()))??;

        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        drop(stream);
        Ok(elapsed)
    }
}

#[async_trait::async_trait]
impl Prober for TcpProber {
    async fn probe(&self, ip: IpAddr, port: u16) -> ProbeResult {
        let addr = SocketAddr::new(ip, port);
        let mut samples = Vec::with_capacity(self.settings.trials as usize);

        for trial in 0..self.settings.trials {
            if trial > 0 && !self.settings.spacing.is_zero() {
                sleep(self.settings.spacing).await;
            }

            match self.connect_once(addr).await {
                Ok(delay_ms) => {
                    debug!("TCP {addr} trial {trial} connect={delay_ms:.2}ms");
                    samples.push(delay_ms);
                }
                Err(e) => warn!("TCP ping to {addr} failed: {e}"),
            }
        }

        ProbeResult::new(average_samples(&samples, self.settings.max_delay_ms))
    }
}

/// Mean of the samples not above `max_delay_ms`, rounded to two decimals
pub fn average_samples(samples: &[f64], max_delay_ms: f64) -> Option<f64> {
    let kept: Vec<f64> = samples.iter().copied().filter(|delay| *delay <= max_delay_ms).collect();
    if kept.is_empty() {
        return None;
    }

    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}
