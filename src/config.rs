use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pubsub::RetryPolicy;

/// Substituted when neither `PROJECT_ID` nor `GCP_PROJECT` is set.
pub const PROJECT_PLACEHOLDER: &str = "PROJECT_ID env var not set";
/// Substituted when `BUCKET` is not set.
pub const BUCKET_PLACEHOLDER: &str = "BUCKET env var not set";

/// Key lookup used by the loaders; `std::env::var` in production.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub detector: DetectorConfig,
    pub providers: ProviderConfig,
    pub retry: RetryPolicy,
}

impl Config {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::load(&|key: &str| env::var(key).ok())
    }

    pub fn load(env: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            server: ServerConfig::load(env)?,
            log: LogConfig::load(env),
            detector: DetectorConfig::load(env)?,
            providers: ProviderConfig::load(env),
            retry: load_retry(env)?,
        })
    }
}

// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn load(env: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            host: get_env(env, "HOST", "0.0.0.0")?,
            port: get_env(env, "PORT", "8080")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// LOGGING
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Severity name (`DEBUG`, `INFO`, `WARNING`, ...) or a raw filter directive.
    pub level: String,
    pub format: String,
}

impl LogConfig {
    fn load(env: Lookup<'_>) -> Self {
        Self {
            level: env("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            format: env("LOG_FORMAT").unwrap_or_else(|| "json".to_string()),
        }
    }
}

// DETECTOR
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub project_id: String,
    pub bucket: String,
    /// Variables that were absent and replaced by a placeholder.
    pub missing: Vec<&'static str>,
    /// Refuse to run with placeholders instead of letting provider calls fail.
    pub strict: bool,
}

impl DetectorConfig {
    pub fn new(project_id: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            bucket: bucket.into(),
            missing: Vec::new(),
            strict: false,
        }
    }

    fn load(env: Lookup<'_>) -> Result<Self> {
        let mut missing = Vec::new();

        let project_id = match env("PROJECT_ID").or_else(|| env("GCP_PROJECT")) {
            Some(value) => value,
            None => {
                missing.push("PROJECT_ID");
                PROJECT_PLACEHOLDER.to_string()
            }
        };
        let bucket = match env("BUCKET") {
            Some(value) => value,
            None => {
                missing.push("BUCKET");
                BUCKET_PLACEHOLDER.to_string()
            }
        };

        Ok(Self {
            project_id,
            bucket,
            missing,
            strict: get_flag(env, "STRICT_CONFIG", false)?,
        })
    }

    /// Reports placeholders. Only strict mode turns them into an error.
    pub fn check(&self) -> Result<()> {
        if self.missing.is_empty() {
            return Ok(());
        }
        for name in &self.missing {
            tracing::error!(variable = *name, "Config error: {} env var not set", name);
        }
        if self.strict {
            return Err(Error::config(format!(
                "missing required variables: {}",
                self.missing.join(", ")
            )));
        }
        Ok(())
    }
}

// PROVIDERS
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// `host:port` of a Pub/Sub emulator; disables authentication.
    pub pubsub_emulator_host: Option<String>,
    /// Serve buckets from directories below this path instead of GCS.
    pub local_root: Option<PathBuf>,
}

impl ProviderConfig {
    fn load(env: Lookup<'_>) -> Self {
        Self {
            pubsub_emulator_host: env("PUBSUB_EMULATOR_HOST").filter(|v| !v.is_empty()),
            local_root: env("SNAPSHOT_LOCAL_ROOT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

// RETRY
fn load_retry(env: Lookup<'_>) -> Result<RetryPolicy> {
    let multiplier: f64 = get_env(env, "RETRY_MULTIPLIER", "2.0")?;
    if !(multiplier >= 1.0 && multiplier.is_finite()) {
        return Err(Error::config("RETRY_MULTIPLIER must be >= 1.0"));
    }
    let max_attempts: u32 = get_env(env, "RETRY_MAX_ATTEMPTS", "10")?;
    if max_attempts == 0 {
        return Err(Error::config("RETRY_MAX_ATTEMPTS must be at least 1"));
    }

    Ok(RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(get_env(env, "RETRY_INITIAL_BACKOFF_MS", "1000")?),
        max_backoff:     Duration::from_millis(get_env(env, "RETRY_MAX_BACKOFF_MS", "60000")?),
        multiplier,
        deadline:        Duration::from_millis(get_env(env, "RETRY_DEADLINE_MS", "120000")?),
    })
}

// --- PRIVATE HELPERS ---

fn get_env<T: FromStr>(env: Lookup<'_>, key: &str, default: &str) -> Result<T> {
    env(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be valid", key)))
}

fn get_flag(env: Lookup<'_>, key: &str, default: bool) -> Result<bool> {
    match env(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(Error::config(format!("{} must be a boolean", key))),
        },
    }
}
