use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregate::FailurePolicy;
use crate::portal::client::DEFAULT_TIMEOUT;

#[derive(thiserror::Error, Debug)]
#[error("Invalid value for {name}: '{value}' ({reason})")]
pub struct ConfigError {
    name: &'static str,
    value: String,
    reason: String,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime settings for the downloader, read from `TRANSIT_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Seed file to load instead of the bundled one
    pub sources: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    pub concurrency: usize,
    pub policy: FailurePolicy,
    pub explode_stops: bool,
    /// Only these modes, when set
    pub modes: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: None,
            output_dir: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
            concurrency: 1,
            policy: FailurePolicy::default(),
            explode_stops: true,
            modes: None,
        }
    }
}

impl Config {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Config::default();

        if let Some(sources) = lookup("TRANSIT_SOURCES") {
            config.sources = Some(PathBuf::from(sources));
        }
        if let Some(output_dir) = lookup("TRANSIT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }
        if let Some(value) = lookup("TRANSIT_TIMEOUT_SECS") {
            let secs = value
                .parse::<u64>()
                .map_err(|e| invalid("TRANSIT_TIMEOUT_SECS", &value, e))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(value) = lookup("TRANSIT_CONCURRENCY") {
            config.concurrency = match value.parse::<usize>() {
                Ok(0) => return Err(invalid("TRANSIT_CONCURRENCY", &value, "must be at least 1")),
                Ok(n) => n,
                Err(e) => return Err(invalid("TRANSIT_CONCURRENCY", &value, e)),
            };
        }
        if let Some(value) = lookup("TRANSIT_FAILURE_POLICY") {
            config.policy = value
                .parse()
                .map_err(|e| invalid("TRANSIT_FAILURE_POLICY", &value, e))?;
        }
        if let Some(value) = lookup("TRANSIT_EXPLODE_STOPS") {
            config.explode_stops = value
                .parse()
                .map_err(|e| invalid("TRANSIT_EXPLODE_STOPS", &value, e))?;
        }
        if let Some(value) = lookup("TRANSIT_MODES") {
            let modes = value
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect::<Vec<_>>();
            if !modes.is_empty() {
                config.modes = Some(modes);
            }
        }

        Ok(config)
    }
}

fn invalid(name: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
