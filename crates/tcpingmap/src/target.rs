//! Target configuration types.
//!
//! The configuration is a three level mapping `region -> subregion -> operator`
//! whose leaves name a host (or IP literal) and a port.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EndpointError;

/// Leaf of the target configuration
///
/// Fields are kept as raw JSON so a single malformed leaf does not reject the
/// whole configuration; [`Endpoint::target`] validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Endpoint {
    /// Host name or IP literal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Value>,

    /// TCP port to connect to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Value>,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { ip: Some(Value::String(host.into())), port: Some(Value::from(port)) }
    }

    /// Host and port of this leaf, if both are present and well formed
    pub fn target(&self) -> Result<(&str, u16), EndpointError> {
        let host = match &self.ip {
            None => return Err(EndpointError::MissingIp),
            Some(Value::String(host)) if !host.trim().is_empty() => host.as_str(),
            Some(other) => return Err(EndpointError::InvalidIp(other.clone())),
        };

        let port = match &self.port {
            None => return Err(EndpointError::MissingPort),
            Some(value) => value
                .as_u64()
                .and_then(|port| u16::try_from(port).ok())
                .ok_or_else(|| EndpointError::InvalidPort(value.clone()))?,
        };

        Ok((host, port))
    }
}

/// Anything that is not an object becomes an endpoint with neither field set
impl From<Value> for Endpoint {
    fn from(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        let mut take = |name: &str| fields.remove(name).filter(|value| !value.is_null());

        Self { ip: take("ip"), port: take("port") }
    }
}

type Operators = BTreeMap<String, Endpoint>;
type Subregions = BTreeMap<String, Operators>;

/// Nested target configuration as fetched from the config source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetConfig(BTreeMap<String, Subregions>);

impl TargetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from its JSON form
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Insert or replace one leaf
    pub fn insert(
        &mut self,
        region: impl Into<String>,
        subregion: impl Into<String>,
        operator: impl Into<String>,
        endpoint: Endpoint,
    ) {
        self.0
            .entry(region.into())
            .or_default()
            .entry(subregion.into())
            .or_default()
            .insert(operator.into(), endpoint);
    }

    /// Builder-style variant of [`TargetConfig::insert`]
    pub fn with_target(
        mut self,
        region: impl Into<String>,
        subregion: impl Into<String>,
        operator: impl Into<String>,
        endpoint: Endpoint,
    ) -> Self {
        self.insert(region, subregion, operator, endpoint);
        self
    }

    /// Iterate over every leaf together with its structured key
    pub fn leaves(&self) -> impl Iterator<Item = (TargetKey, &Endpoint)> {
        self.0.iter().flat_map(|(region, subregions)| {
            subregions.iter().flat_map(move |(subregion, operators)| {
                operators.iter().map(move |(operator, endpoint)| {
                    (TargetKey::new(region.as_str(), subregion.as_str(), operator.as_str()), endpoint)
                })
            })
        })
    }

    /// Number of leaves, including ones that will be skipped
    pub fn len(&self) -> usize {
        self.0.values().flat_map(|s| s.values()).map(|o| o.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Structured identity of a target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub region: String,
    pub subregion: String,
    pub operator: String,
}

impl TargetKey {
    pub fn new(
        region: impl Into<String>,
        subregion: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self { region: region.into(), subregion: subregion.into(), operator: operator.into() }
    }

    /// Key shown to consumers, e.g. `East-CityA (ISP1)`
    pub fn display_key(&self) -> String {
        format!("{}-{} ({})", self.region, self.subregion, self.operator)
    }
}

/// Log form, e.g. `East-CityA-ISP1`
impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.region, self.subregion, self.operator)
    }
}

/// A target whose host has been resolved to an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub key: TargetKey,
    pub ip: IpAddr,
    pub port: u16,
}
