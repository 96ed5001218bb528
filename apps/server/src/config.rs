use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fmt, fs};

use serde::{Deserialize, Serialize};
use tcpingmap::{Backoff, ConfigSource, ProbeSettings, RetryPolicy};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config directory available, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub source: Source,
    pub probe: Probe,
    pub schedule: Schedule,
    pub storage: Storage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub kind: SourceKind,
    pub url: String,
    pub path: PathBuf,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub backoff: BackoffKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub timeout_ms: u64,
    pub trials: u32,
    pub max_delay_ms: f64,
    pub spacing_ms: u64,
    pub max_workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub result_path: PathBuf,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 5000 }
    }
}

impl Default for Source {
    fn default() -> Self {
        Self {
            kind: SourceKind::Local,
            url: String::new(),
            path: "config.json".into(),
            request_timeout_secs: 10,
            max_attempts: 3,
            retry_delay_secs: 5,
            backoff: BackoffKind::Fixed,
        }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            trials: 3,
            max_delay_ms: 500.0,
            spacing_ms: 1000,
            max_workers: tcpingmap::DEFAULT_MAX_WORKERS,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self { interval_secs: tcpingmap::DEFAULT_CYCLE_INTERVAL_SECS }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self { result_path: "result.json".into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().is_none_or(|ext| ext != "toml") {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/tcpingmap/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("tcpingmap/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration State:")?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        write_title_1(f, "Target Source")?;
        match self.source.kind {
            SourceKind::Remote => write_1(f, "Remote URL", &self.source.url)?,
            SourceKind::Local => write_1(f, "Local File", &self.source.path.display())?,
        }
        write_1(f, "Max Attempts", &self.source.max_attempts)?;
        write_1(f, "Retry Delay (s)", &self.source.retry_delay_secs)?;

        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (ms)", &self.probe.timeout_ms)?;
        write_1(f, "Trials", &self.probe.trials)?;
        write_1(f, "Max Delay (ms)", &self.probe.max_delay_ms)?;
        write_1(f, "Max Workers", &self.probe.max_workers)?;

        write_title_1(f, "Schedule")?;
        write_1(f, "Interval (s)", &self.schedule.interval_secs)?;

        write_title_1(f, "Storage")?;
        write_1(f, "Result File", &self.storage.result_path.display())?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/tcpingmap/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<Path>>) -> Result<Self, Error> {
        let config_path: PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;
        let write_err = |source| Error::WriteFailed { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        fs::write(path, config_str).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.source.kind == SourceKind::Remote && self.source.url.trim().is_empty() {
            return Err(Error::Invalid("source.url is required for a remote source".into()));
        }
        if self.probe.trials == 0 {
            return Err(Error::Invalid("probe.trials must be at least 1".into()));
        }
        if self.probe.max_workers == 0 {
            return Err(Error::Invalid("probe.max_workers must be at least 1".into()));
        }
        if self.schedule.interval_secs == 0 {
            return Err(Error::Invalid("schedule.interval_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.bind, self.server.port).parse()
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings::default()
            .with_timeout(Duration::from_millis(self.probe.timeout_ms))
            .with_trials(self.probe.trials)
            .with_max_delay_ms(self.probe.max_delay_ms)
            .with_spacing(Duration::from_millis(self.probe.spacing_ms))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.source.max_attempts,
            delay: Duration::from_secs(self.source.retry_delay_secs),
            backoff: match self.source.backoff {
                BackoffKind::Fixed => Backoff::Fixed,
                BackoffKind::Exponential => Backoff::Exponential,
            },
        }
    }

    pub fn config_source(&self) -> Result<ConfigSource, Error> {
        match self.source.kind {
            SourceKind::Local => Ok(ConfigSource::local(&self.source.path)),
            SourceKind::Remote => ConfigSource::remote(
                self.source.url.clone(),
                Duration::from_secs(self.source.request_timeout_secs),
            )
            .map_err(|e| Error::Invalid(format!("cannot build HTTP client: {e}"))),
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }
}
