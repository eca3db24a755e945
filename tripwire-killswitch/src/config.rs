//! Poller configuration.

use crate::{KillswitchError, KillswitchResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Environment variable prefix read by [`KillswitchConfig::from_env`].
pub const ENV_PREFIX: &str = "TRIPWIRE_KILLSWITCH";

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How much randomness is added to each polling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Up to ±5% of the interval (a window of 10% centred on it).
    #[default]
    Proportional,
    /// Add a uniformly random delay in `[0, window)` to the interval.
    Window(Duration),
}

/// Killswitch poller configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tripwire_killswitch::KillswitchConfig;
///
/// let config = KillswitchConfig::new("/etc/tripwire/killswitch")
///     .with_poll_interval(Duration::from_secs(5))
///     .with_missing_is_empty(true);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.poll_interval(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KillswitchConfig {
    /// File path or blob URL passed to the store.
    pub locator: String,

    /// Base interval between polls, in milliseconds.
    pub poll_interval_ms: u64,

    /// Fixed jitter window in milliseconds; `None` uses proportional jitter.
    pub jitter_ms: Option<u64>,

    /// Treat a missing source as "nothing disabled" instead of an error.
    pub missing_is_empty: bool,
}

impl Default for KillswitchConfig {
    fn default() -> Self {
        Self {
            locator: String::new(),
            poll_interval_ms: as_millis(DEFAULT_POLL_INTERVAL),
            jitter_ms: None,
            missing_is_empty: false,
        }
    }
}

impl KillswitchConfig {
    /// Create a configuration for the given locator.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `TRIPWIRE_KILLSWITCH_*` environment variables.
    ///
    /// Unset variables keep their defaults; malformed numbers are an error.
    pub fn from_env() -> KillswitchResult<Self> {
        let mut config = Self::default();

        if let Some(locator) = load_var("LOCATOR") {
            config.locator = locator;
        }
        if let Some(raw) = load_var("POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_u64("POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = load_var("JITTER_MS") {
            config.jitter_ms = Some(parse_u64("JITTER_MS", &raw)?);
        }
        if let Some(raw) = load_var("MISSING_IS_EMPTY") {
            config.missing_is_empty = raw == "1" || raw.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }

    /// Set the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = as_millis(interval);
        self
    }

    /// Use a fixed jitter window instead of proportional jitter.
    pub fn with_jitter(mut self, window: Duration) -> Self {
        self.jitter_ms = Some(as_millis(window));
        self
    }

    /// Treat a missing source as an empty killswitch.
    pub fn with_missing_is_empty(mut self, missing_is_empty: bool) -> Self {
        self.missing_is_empty = missing_is_empty;
        self
    }

    /// Base polling interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Jitter policy.
    pub fn jitter(&self) -> Jitter {
        match self.jitter_ms {
            Some(ms) => Jitter::Window(Duration::from_millis(ms)),
            None => Jitter::Proportional,
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> KillswitchResult<()> {
        if self.locator.trim().is_empty() {
            return Err(KillswitchError::Config(
                "killswitch locator must not be empty".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(KillswitchError::Config(
                "killswitch poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn load_var(key: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, key)).ok()
}

fn parse_u64(key: &str, raw: &str) -> KillswitchResult<u64> {
    raw.trim().parse().map_err(|_| {
        KillswitchError::Config(format!("{}_{} must be an integer, got '{}'", ENV_PREFIX, key, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KillswitchConfig::default();
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.jitter(), Jitter::Proportional);
        assert!(!config.missing_is_empty);
    }

    #[test]
    fn test_validate_rejects_empty_locator() {
        let err = KillswitchConfig::default().validate().unwrap_err();
        assert!(matches!(err, KillswitchError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = KillswitchConfig::new("ks").with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_jitter() {
        let config = KillswitchConfig::new("ks").with_jitter(Duration::from_millis(250));
        assert_eq!(config.jitter(), Jitter::Window(Duration::from_millis(250)));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = KillswitchConfig::new("ks")
            .with_poll_interval(Duration::MAX)
            .with_jitter(Duration::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);
        assert_eq!(config.jitter_ms, Some(u64::MAX));
        assert_eq!(config.poll_interval(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_parse_u64_error_names_variable() {
        let err = parse_u64("POLL_INTERVAL_MS", "soon").unwrap_err();
        assert!(err.to_string().contains("TRIPWIRE_KILLSWITCH_POLL_INTERVAL_MS"));
    }
}
