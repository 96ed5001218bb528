//! Host resolution with an IPv4-first policy.

use std::net::IpAddr;

use tracing::{debug, info};

use crate::error::ResolutionError;

/// Resolver trait so the orchestrator can be driven with test doubles
///
/// Implementors only provide [`Resolver::lookup`]; literal detection and the
/// address family preference live in [`Resolver::resolve`].
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    /// Every address the name resolves to, in lookup order
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolutionError>;

    /// Turn a host name or IP literal into a single address
    async fn resolve(&self, host: &str) -> Result<IpAddr, ResolutionError> {
        if let Some(ip) = parse_literal(host) {
            debug!("Resolved {host} (already an IP)");
            return Ok(ip);
        }

        let ip = pick_preferred(self.lookup(host).await?)
            .ok_or_else(|| ResolutionError::NoAddress { host: host.to_string() })?;

        info!("Resolved {host} to {ip}");
        Ok(ip)
    }
}

/// Resolver backed by the operating system's lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolutionError> {
        let addrs = tokio::net::lookup_host((host, 0))
            .await
            .map_err(|source| ResolutionError::Lookup { host: host.to_string(), source })?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Parse an IPv4 or IPv6 literal, accepting the bracketed IPv6 form
pub fn parse_literal(host: &str) -> Option<IpAddr> {
    let trimmed = host.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);
    unbracketed.parse().ok()
}

/// First IPv4 address if any, otherwise the first address of any family
pub fn pick_preferred(addrs: impl IntoIterator<Item = IpAddr>) -> Option<IpAddr> {
    let mut first = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        first.get_or_insert(addr);
    }
    first
}
