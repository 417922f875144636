//! Subscriber setup for the process.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, for the hosting log sink.
    #[default]
    Json,
    /// Human-readable, for local runs.
    Pretty,
}

impl LogFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" | "" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(Error::config(format!("unknown LOG_FORMAT '{}'", other))),
        }
    }
}

/// Translates a severity name to a filter directive. `WARNING` and
/// `CRITICAL` are accepted for compatibility; anything else passes through.
pub fn level_directive(level: &str) -> String {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace".to_string(),
        "DEBUG" => "debug".to_string(),
        "INFO" | "" => "info".to_string(),
        "WARN" | "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" | "FATAL" => "error".to_string(),
        _ => level.trim().to_string(),
    }
}

/// Installs the global subscriber. Call once, before the first invocation.
pub fn init(config: &LogConfig) -> Result<()> {
    let directive = level_directive(&config.level);
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| Error::config(format!("invalid LOG_LEVEL '{}': {e}", config.level)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match LogFormat::parse(&config.format)? {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).flatten_event(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };
    installed.map_err(|e| Error::config(format!("logging already initialised: {e}")))?;

    tracing::info!(level = %directive, "log level={}", config.level);
    Ok(())
}
