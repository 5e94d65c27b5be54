//! Service configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::ConfigError;
use crate::fetcher::{SourceLocations, DEFAULT_FETCH_ATTEMPTS, DEFAULT_FETCH_TIMEOUT};

/// Default download location of the five files.
pub const DEFAULT_BASE_URL: &str = "https://base-donnees-publique.medicaments.gouv.fr/download/file";

/// Default local update times.
pub const DEFAULT_UPDATE_TIMES: &str = "06:00,18:00";

/// Default shutdown grace period.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Runtime configuration of the refresh service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Where the five files are fetched from.
    pub sources: SourceLocations,
    /// Where transcoded copies are staged.
    pub scratch_dir: PathBuf,
    /// Local wall-clock times of scheduled updates, sorted.
    pub update_times: Vec<NaiveTime>,
    /// Hard timeout of one fetch attempt.
    pub fetch_timeout: Duration,
    /// Attempts per file.
    pub fetch_attempts: u32,
    /// How long shutdown waits for a running cycle.
    pub shutdown_grace: Duration,
}

impl ServiceConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sources = match lookup("BDPM_SOURCE_DIR") {
            Some(dir) if !dir.trim().is_empty() => SourceLocations::from_dir(dir.trim()),
            _ => {
                let base = lookup("BDPM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
                if base.trim().is_empty() {
                    return Err(ConfigError::Invalid {
                        key: "BDPM_BASE_URL",
                        value: base,
                    });
                }
                SourceLocations::from_base(base.trim())
            }
        };

        let scratch_dir = lookup("BDPM_SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("bdpm"));

        let update_times = match lookup("BDPM_UPDATE_TIMES") {
            Some(value) => parse_update_times(&value).ok_or(ConfigError::Invalid {
                key: "BDPM_UPDATE_TIMES",
                value,
            })?,
            None => parse_update_times(DEFAULT_UPDATE_TIMES).unwrap_or_default(),
        };

        let fetch_timeout = match lookup("BDPM_FETCH_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(positive("BDPM_FETCH_TIMEOUT_SECS", value)?),
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let fetch_attempts = match lookup("BDPM_FETCH_RETRIES") {
            Some(value) => {
                let attempts = positive("BDPM_FETCH_RETRIES", value.clone())?;
                u32::try_from(attempts).map_err(|_| ConfigError::Invalid {
                    key: "BDPM_FETCH_RETRIES",
                    value,
                })?
            }
            None => DEFAULT_FETCH_ATTEMPTS,
        };

        let shutdown_grace = match lookup("BDPM_SHUTDOWN_GRACE_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        key: "BDPM_SHUTDOWN_GRACE_SECS",
                        value,
                    })
                }
            },
            None => DEFAULT_SHUTDOWN_GRACE,
        };

        Ok(Self {
            sources,
            scratch_dir,
            update_times,
            fetch_timeout,
            fetch_attempts,
            shutdown_grace,
        })
    }
}

fn positive(key: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

/// Parses a comma-separated list of `HH:MM` times.
///
/// Returns the times sorted and deduplicated, or `None` if the list is
/// empty or any entry is invalid.
pub fn parse_update_times(value: &str) -> Option<Vec<NaiveTime>> {
    let mut times = value
        .split(',')
        .map(|t| NaiveTime::parse_from_str(t.trim(), "%H:%M").ok())
        .collect::<Option<Vec<_>>>()?;

    times.sort();
    times.dedup();
    (!times.is_empty()).then_some(times)
}
