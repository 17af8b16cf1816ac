//! Environment-sourced settings for the log store.

use std::path::PathBuf;
use std::time::Duration;

use crate::models::{CoreError, CoreResult};

pub const ENV_DB_PATH: &str = "TUNGLOG_DB_PATH";
pub const ENV_POOL_MIN: &str = "TUNGLOG_POOL_MIN";
pub const ENV_POOL_MAX: &str = "TUNGLOG_POOL_MAX";
pub const ENV_RETRY_ATTEMPTS: &str = "TUNGLOG_RETRY_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "TUNGLOG_RETRY_BASE_DELAY_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "TUNGLOG_CONNECT_TIMEOUT_MS";

const DEFAULT_DB_PATH: &str = "tunglog.sqlite3";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub pool_min: u32,
    pub pool_max: u32,
    pub retry_attempts: u32,
    pub retry_base_delay: Duration,
    /// Bounds both pool checkout and SQLite's busy wait.
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            pool_min: 1,
            pool_max: 5,
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(5000),
        }
    }
}

impl StoreConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source; unset or blank
    /// variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let defaults = Self::default();
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let config = Self {
            database_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            pool_min: parse_number(ENV_POOL_MIN, read(ENV_POOL_MIN))?.unwrap_or(defaults.pool_min),
            pool_max: parse_number(ENV_POOL_MAX, read(ENV_POOL_MAX))?.unwrap_or(defaults.pool_max),
            retry_attempts: parse_number(ENV_RETRY_ATTEMPTS, read(ENV_RETRY_ATTEMPTS))?
                .unwrap_or(defaults.retry_attempts),
            retry_base_delay: parse_number(ENV_RETRY_BASE_DELAY_MS, read(ENV_RETRY_BASE_DELAY_MS))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            connect_timeout: parse_number(ENV_CONNECT_TIMEOUT_MS, read(ENV_CONNECT_TIMEOUT_MS))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.pool_max == 0 {
            return Err(CoreError::invalid_input(format!(
                "{ENV_POOL_MAX} must be at least 1"
            )));
        }
        if self.pool_min > self.pool_max {
            return Err(CoreError::invalid_input(format!(
                "{ENV_POOL_MIN} ({}) must not exceed {ENV_POOL_MAX} ({})",
                self.pool_min, self.pool_max
            )));
        }
        if self.retry_attempts == 0 {
            return Err(CoreError::invalid_input(format!(
                "{ENV_RETRY_ATTEMPTS} must be at least 1"
            )));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: Option<String>) -> CoreResult<Option<T>> {
    raw.map(|value| {
        value.trim().parse::<T>().map_err(|_| {
            CoreError::invalid_input(format!("{name} must be a non-negative integer, got '{value}'"))
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{ENV_DB_PATH, ENV_POOL_MAX, ENV_POOL_MIN, ENV_RETRY_BASE_DELAY_MS, StoreConfig};
    use crate::models::CoreErrorKind;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.pool_min, 1);
        assert_eq!(config.pool_max, 5);
    }

    #[test]
    fn variables_override_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/var/lib/tunglog/logs.db"),
            (ENV_POOL_MIN, "2"),
            (ENV_POOL_MAX, "8"),
            (ENV_RETRY_BASE_DELAY_MS, "25"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/tunglog/logs.db"));
        assert_eq!(config.pool_min, 2);
        assert_eq!(config.pool_max, 8);
        assert_eq!(config.retry_base_delay, Duration::from_millis(25));
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = StoreConfig::from_lookup(lookup(&[(ENV_POOL_MAX, "  ")])).unwrap();
        assert_eq!(config.pool_max, 5);
    }

    #[test]
    fn unparsable_number_names_the_variable() {
        let error = StoreConfig::from_lookup(lookup(&[(ENV_POOL_MAX, "many")])).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
        assert!(error.message.contains(ENV_POOL_MAX));
    }

    #[test]
    fn pool_bounds_are_validated() {
        let inverted = StoreConfig::from_lookup(lookup(&[(ENV_POOL_MIN, "6"), (ENV_POOL_MAX, "2")]));
        assert!(inverted.is_err());

        let empty = StoreConfig::from_lookup(lookup(&[(ENV_POOL_MIN, "0"), (ENV_POOL_MAX, "0")]));
        assert!(empty.is_err());
    }
}
