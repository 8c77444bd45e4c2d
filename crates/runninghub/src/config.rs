//! Orchestrator configuration loaded from environment variables.
//!
//! Everything except the API key has a default. Poll intervals must be
//! positive; a zero interval is a configuration error.

use std::time::Duration;

use photofx_core::region::REGION_HONGKONG;

use crate::api::ClientTimeouts;
use crate::backoff::PollConfig;

/// Errors loading [`OrchestratorConfig`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    /// A variable is set but does not parse.
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Orchestrator configuration loaded from environment variables.
///
/// Everything except the API key has a default suitable for production.
#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Provider API key.
    pub api_key: String,
    /// Region used when the caller does not name one.
    pub default_region: String,
    /// Per-call HTTP timeouts.
    pub timeouts: ClientTimeouts,
    /// Polling policy.
    pub poll: PollConfig,
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("api_key", &"<redacted>")
            .field("default_region", &self.default_region)
            .field("timeouts", &self.timeouts)
            .field("poll", &self.poll)
            .finish()
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default    |
    /// |------------------------------|------------|
    /// | `RUNNINGHUB_API_KEY`         | (required) |
    /// | `RUNNINGHUB_REGION`          | `hongkong` |
    /// | `SUBMIT_TIMEOUT_SECS`        | `60`       |
    /// | `REQUEST_TIMEOUT_SECS`       | `15`       |
    /// | `POLL_INITIAL_INTERVAL_MS`   | `2000`     |
    /// | `POLL_MAX_INTERVAL_MS`       | `10000`    |
    /// | `POLL_TIMEOUT_SECS`          | `600`      |
    /// | `POLL_MAX_TRANSIENT_RETRIES` | `5`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`from_env`](Self::from_env) delegates here; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("RUNNINGHUB_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("RUNNINGHUB_API_KEY"))?;

        let default_region = lookup("RUNNINGHUB_REGION")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| REGION_HONGKONG.to_string());

        let timeouts_default = ClientTimeouts::default();
        let timeouts = ClientTimeouts {
            submit: Duration::from_secs(parse_or(
                &lookup,
                "SUBMIT_TIMEOUT_SECS",
                timeouts_default.submit.as_secs(),
            )?),
            request: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                timeouts_default.request.as_secs(),
            )?),
        };

        let poll_default = PollConfig::default();
        let poll = PollConfig {
            initial_interval: Duration::from_millis(parse_positive_or(
                &lookup,
                "POLL_INITIAL_INTERVAL_MS",
                poll_default.initial_interval.as_millis() as u64,
            )?),
            max_interval: Duration::from_millis(parse_positive_or(
                &lookup,
                "POLL_MAX_INTERVAL_MS",
                poll_default.max_interval.as_millis() as u64,
            )?),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "POLL_TIMEOUT_SECS",
                poll_default.timeout.as_secs(),
            )?),
            max_transient_retries: parse_or(
                &lookup,
                "POLL_MAX_TRANSIENT_RETRIES",
                poll_default.max_transient_retries,
            )?,
            ..poll_default
        };

        Ok(Self {
            api_key,
            default_region,
            timeouts,
            poll,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected: "a non-negative integer",
            value: raw,
        }),
    }
}

/// Like [`parse_or`], but zero is rejected.
fn parse_positive_or<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            expected: "a positive integer",
            value: lookup(name).unwrap_or_default(),
        }),
        value => Ok(value),
    }
}
