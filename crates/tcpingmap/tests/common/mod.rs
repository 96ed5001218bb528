//! Test doubles shared by the integration tests

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tcpingmap::{ProbeResult, Prober, ResolutionError, Resolver};

/// Resolver answering from a fixed table and counting lookups
#[derive(Default)]
pub struct TableResolver {
    table: HashMap<String, Vec<IpAddr>>,
    lookups: AtomicUsize,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: &str, addrs: &[&str]) -> Self {
        let addrs = addrs.iter().map(|addr| addr.parse().unwrap()).collect();
        self.table.insert(host.to_string(), addrs);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Resolver for TableResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolutionError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.table
            .get(host)
            .cloned()
            .ok_or_else(|| ResolutionError::NoAddress { host: host.to_string() })
    }
}

/// Prober that sleeps for a while and records how many probes overlap
pub struct GaugeProber {
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl GaugeProber {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Prober for GaugeProber {
    async fn probe(&self, ip: IpAddr, _port: u16) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        // Encode the last octet so tests can tell results apart
        let octet = match ip {
            IpAddr::V4(v4) => v4.octets()[3],
            IpAddr::V6(v6) => v6.octets()[15],
        };
        ProbeResult::new(Some(f64::from(octet)))
    }
}

/// Prober that panics for one address and succeeds for the rest
pub struct FlakyProber {
    pub poisoned: IpAddr,
}

#[async_trait::async_trait]
impl Prober for FlakyProber {
    async fn probe(&self, ip: IpAddr, _port: u16) -> ProbeResult {
        if ip == self.poisoned {
            panic!("probe of {ip} blew up");
        }
        ProbeResult::new(Some(1.0))
    }
}
