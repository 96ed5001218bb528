use std::env::var;
use std::str::FromStr;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log layer, read from `RUST_LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Initialize tracing at `info`, overridable through `RUST_LOG`
pub fn init_tracing() {
    init(LevelFilter::INFO);
}

/// Initialize tracing with `level` as the default directive
///
/// Does nothing if a global subscriber is already installed.
pub fn init(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let raw_format = var("RUST_LOG_FORMAT").unwrap_or_default();
    let (format, format_error) = match raw_format.parse::<LogFormat>() {
        Ok(format) => (format, None),
        Err(error) => (LogFormat::default(), Some(error)),
    };

    let log_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(env_filter)
            .boxed(),
    };

    if tracing_subscriber::registry().with(log_layer).try_init().is_err() {
        return;
    }

    if let Some(error) = format_error {
        warn!("Invalid RUST_LOG_FORMAT, falling back to compact: {error}");
    }
}
