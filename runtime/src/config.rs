//! Configuration for the expiration alert scheduler.
//!
//! Build it in code with the `with_*` methods, or load it from the
//! environment:
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `GOVERNANCE_MAILBOX` | yes | |
//! | `LCID_EXPIRATION_CHECK_INTERVAL_SECS` | no | 86400 |
//! | `LCID_ALERT_WINDOW_HOURS` | no | 1440 |
//! | `LCID_FOLLOW_UP_AFTER_HOURS` | no | 336 |

use intake_governance_core::expiration::AlertThresholds;
use intake_governance_core::ports::EmailAddress;
use std::time::Duration;
use thiserror::Error;

/// Default time between scheduler passes (24 hours)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const MAILBOX_VAR: &str = "GOVERNANCE_MAILBOX";
const INTERVAL_VAR: &str = "LCID_EXPIRATION_CHECK_INTERVAL_SECS";
const WINDOW_VAR: &str = "LCID_ALERT_WINDOW_HOURS";
const FOLLOW_UP_VAR: &str = "LCID_FOLLOW_UP_AFTER_HOURS";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// An environment variable could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: String,
        /// Raw value
        value: String,
    },

    /// Values parsed but are not usable together
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Expiration alert scheduler configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertSchedulerConfig {
    /// Time between passes
    pub tick_interval: Duration,
    /// Governance team mailbox; always receives alerts
    pub governance_mailbox: EmailAddress,
    /// Alert window and follow-up gap
    pub thresholds: AlertThresholds,
}

impl AlertSchedulerConfig {
    /// Creates a configuration with production defaults
    #[must_use]
    pub fn new(governance_mailbox: EmailAddress) -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            governance_mailbox,
            thresholds: AlertThresholds::default(),
        }
    }

    /// Sets the time between passes
    #[must_use]
    pub const fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Sets the alert thresholds
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `GOVERNANCE_MAILBOX` is missing or any value
    /// is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// See [`AlertSchedulerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mailbox = lookup(MAILBOX_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::EnvVarNotSet(MAILBOX_VAR.to_string()))?;

        let mut config = Self::new(EmailAddress::new(mailbox.trim().to_string()));

        if let Some(secs) = parse_var::<u64, _>(&lookup, INTERVAL_VAR)? {
            config.tick_interval = Duration::from_secs(secs);
        }
        if let Some(hours) = parse_var::<i64, _>(&lookup, WINDOW_VAR)? {
            config.thresholds.alert_window_hours = hours;
        }
        if let Some(hours) = parse_var::<i64, _>(&lookup, FOLLOW_UP_VAR)? {
            config.thresholds.follow_up_after_hours = hours;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero interval, or for
    /// thresholds that are not positive or do not fit in a duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "tick_interval must be > 0".to_string(),
            ));
        }
        if self.thresholds.alert_window_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "alert_window_hours must be > 0".to_string(),
            ));
        }
        if self.thresholds.follow_up_after_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "follow_up_after_hours must be > 0".to_string(),
            ));
        }
        if !self.thresholds.in_range() {
            return Err(ConfigError::ValidationError(
                "alert thresholds are out of range".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_only_mailbox_set() {
        let config =
            AlertSchedulerConfig::from_lookup(lookup(&[("GOVERNANCE_MAILBOX", "grt@example.gov")]))
                .unwrap();

        assert_eq!(config.governance_mailbox.as_str(), "grt@example.gov");
        assert_eq!(config.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(config.thresholds, AlertThresholds::default());
    }

    #[test]
    fn overrides_from_variables() {
        let config = AlertSchedulerConfig::from_lookup(lookup(&[
            ("GOVERNANCE_MAILBOX", "grt@example.gov"),
            ("LCID_EXPIRATION_CHECK_INTERVAL_SECS", "3600"),
            ("LCID_ALERT_WINDOW_HOURS", "720"),
            ("LCID_FOLLOW_UP_AFTER_HOURS", " 48 "),
        ]))
        .unwrap();

        assert_eq!(config.tick_interval, Duration::from_secs(3600));
        assert_eq!(config.thresholds.alert_window_hours, 720);
        assert_eq!(config.thresholds.follow_up_after_hours, 48);
    }

    #[test]
    fn missing_mailbox() {
        let err = AlertSchedulerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::EnvVarNotSet("GOVERNANCE_MAILBOX".to_string()));

        let err =
            AlertSchedulerConfig::from_lookup(lookup(&[("GOVERNANCE_MAILBOX", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EnvVarNotSet("GOVERNANCE_MAILBOX".to_string()));
    }

    #[test]
    fn malformed_number() {
        let err = AlertSchedulerConfig::from_lookup(lookup(&[
            ("GOVERNANCE_MAILBOX", "grt@example.gov"),
            ("LCID_ALERT_WINDOW_HOURS", "sixty days"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref name, .. } if name == "LCID_ALERT_WINDOW_HOURS"));
    }

    #[test]
    fn rejects_zero_values() {
        let err = AlertSchedulerConfig::from_lookup(lookup(&[
            ("GOVERNANCE_MAILBOX", "grt@example.gov"),
            ("LCID_EXPIRATION_CHECK_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let config = AlertSchedulerConfig::new(EmailAddress::new("grt@example.gov".to_string()))
            .with_thresholds(AlertThresholds {
                alert_window_hours: 1440,
                follow_up_after_hours: 0,
            });
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_thresholds_too_large_for_a_duration() {
        let err = AlertSchedulerConfig::from_lookup(lookup(&[
            ("GOVERNANCE_MAILBOX", "grt@example.gov"),
            ("LCID_ALERT_WINDOW_HOURS", "9223372036854775807"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let config = AlertSchedulerConfig::new(EmailAddress::new("grt@example.gov".to_string()))
            .with_thresholds(AlertThresholds {
                alert_window_hours: 1440,
                follow_up_after_hours: i64::MAX / 2,
            });
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_methods() {
        let config = AlertSchedulerConfig::new(EmailAddress::new("grt@example.gov".to_string()))
            .with_tick_interval(Duration::from_secs(60));
        assert_eq!(config.tick_interval, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }
}
