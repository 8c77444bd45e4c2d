//! Polling interval and deadline policy.
//!
//! The poller waits `initial_interval` after the first status check and
//! grows the wait by `multiplier` after every check, clamped to
//! `max_interval`. Each wait is jittered by up to `jitter` (a fraction of
//! the interval) so many jobs submitted together do not poll in lockstep.

use std::time::Duration;

use photofx_core::TaskError;
use rand::Rng;

/// Tunable parameters for status polling.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Wait after the first status check.
    pub initial_interval: Duration,
    /// Upper bound on the wait between checks.
    pub max_interval: Duration,
    /// Factor by which the wait grows after each check.
    pub multiplier: f64,
    /// Jitter as a fraction of the current interval (`0.1` = +/-10%).
    pub jitter: f64,
    /// Wall-clock budget for the whole polling phase.
    pub timeout: Duration,
    /// Consecutive transient status failures tolerated before giving up.
    pub max_transient_retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            multiplier: 1.5,
            jitter: 0.1,
            timeout: Duration::from_secs(600),
            max_transient_retries: 5,
        }
    }
}

/// Per-call replacements for any subset of [`PollConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollOverrides {
    pub timeout: Option<Duration>,
    pub initial_interval: Option<Duration>,
    pub max_interval: Option<Duration>,
    pub max_transient_retries: Option<u32>,
}

impl PollConfig {
    /// Reject intervals that would make the poller issue status calls
    /// back to back.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.initial_interval.is_zero() {
            return Err(TaskError::InvalidParameter(
                "poll initial_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_interval.is_zero() {
            return Err(TaskError::InvalidParameter(
                "poll max_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return a validated copy with the given overrides applied.
    pub fn with_overrides(&self, overrides: &PollOverrides) -> Result<Self, TaskError> {
        let merged = Self {
            initial_interval: overrides.initial_interval.unwrap_or(self.initial_interval),
            max_interval: overrides.max_interval.unwrap_or(self.max_interval),
            timeout: overrides.timeout.unwrap_or(self.timeout),
            max_transient_retries: overrides
                .max_transient_retries
                .unwrap_or(self.max_transient_retries),
            ..self.clone()
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// Calculate the next interval from the current one.
///
/// The result is clamped to [`PollConfig::max_interval`]; a multiplier
/// below 1 is treated as 1 so intervals never shrink.
pub fn next_interval(current: Duration, config: &PollConfig) -> Duration {
    let factor = config.multiplier.max(1.0);
    let next_ms = (current.as_millis() as f64 * factor) as u64;
    Duration::from_millis(next_ms).min(config.max_interval)
}

/// Apply symmetric random jitter of up to `fraction` of `interval`.
///
/// A non-positive fraction returns `interval` unchanged.
pub fn jittered(interval: Duration, fraction: f64) -> Duration {
    if fraction <= 0.0 || interval.is_zero() {
        return interval;
    }
    let fraction = fraction.min(1.0);
    let offset = rand::rng().random_range(-fraction..=fraction);
    Duration::try_from_secs_f64(interval.as_secs_f64() * (1.0 + offset)).unwrap_or(interval)
}
