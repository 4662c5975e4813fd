//! Runtime knobs for the update transaction.

use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

const MAX_ATTEMPTS_VAR: &str = "PROGRESS_MAX_ATTEMPTS";
const RETRY_BACKOFF_VAR: &str = "PROGRESS_RETRY_BACKOFF_MS";

/// How hard the service retries an update that lost a write race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    max_attempts: u32,
    retry_backoff: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl EngineSettings {
    /// Read `PROGRESS_MAX_ATTEMPTS` and `PROGRESS_RETRY_BACKOFF_MS`, keeping
    /// the default for any variable that is unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_attempts = lookup(MAX_ATTEMPTS_VAR)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(defaults.max_attempts);
        let retry_backoff = lookup(RETRY_BACKOFF_VAR)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(defaults.retry_backoff, Duration::from_millis);
        defaults
            .with_max_attempts(max_attempts)
            .with_retry_backoff(retry_backoff)
    }

    /// Total attempts per update, including the first. Never below one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let settings = EngineSettings::from_lookup(|_| None);
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.max_attempts(), 3);
        assert_eq!(settings.retry_backoff(), Duration::from_millis(10));
    }

    #[test]
    fn variables_override_defaults() {
        let settings = EngineSettings::from_lookup(|key| match key {
            "PROGRESS_MAX_ATTEMPTS" => Some("5".into()),
            "PROGRESS_RETRY_BACKOFF_MS" => Some(" 25 ".into()),
            _ => None,
        });
        assert_eq!(settings.max_attempts(), 5);
        assert_eq!(settings.retry_backoff(), Duration::from_millis(25));
    }

    #[test]
    fn garbage_and_zero_attempts_are_sanitized() {
        let settings = EngineSettings::from_lookup(|key| match key {
            "PROGRESS_MAX_ATTEMPTS" => Some("0".into()),
            "PROGRESS_RETRY_BACKOFF_MS" => Some("soon".into()),
            _ => None,
        });
        assert_eq!(settings.max_attempts(), 1);
        assert_eq!(settings.retry_backoff(), DEFAULT_RETRY_BACKOFF);
    }
}
