//! # Database Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Builder calls (`DbConfig::new(path).max_connections(..)`)
//! 2. Environment variables (`KARAT_DB_*`) via [`DbConfig::from_env`]
//! 3. Defaults (this file)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default database file when `KARAT_DB_PATH` is not set.
pub const DEFAULT_DB_PATH: &str = "./karat.db";

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/karat.db")
///     .max_connections(5)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// How long a writer waits for another connection's write lock.
    /// Default: 5 seconds
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the SQLite busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `KARAT_DB_PATH` | `./karat.db` |
    /// | `KARAT_DB_MAX_CONNECTIONS` | `5` |
    /// | `KARAT_DB_BUSY_TIMEOUT_SECS` | `5` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let path = lookup("KARAT_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        if path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("KARAT_DB_PATH".to_string()));
        }

        let max_connections: u32 = lookup("KARAT_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("KARAT_DB_MAX_CONNECTIONS".to_string()))?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "KARAT_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        let busy_timeout_secs: u64 = lookup("KARAT_DB_BUSY_TIMEOUT_SECS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("KARAT_DB_BUSY_TIMEOUT_SECS".to_string()))?;

        Ok(DbConfig::new(path)
            .max_connections(max_connections)
            .min_connections(1.min(max_connections))
            .busy_timeout(Duration::from_secs(busy_timeout_secs)))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .busy_timeout(Duration::from_secs(1));

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = DbConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("KARAT_DB_PATH", "/var/lib/karat/shop.db"),
            ("KARAT_DB_MAX_CONNECTIONS", "8"),
            ("KARAT_DB_BUSY_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/karat/shop.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.busy_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(matches!(
            DbConfig::from_lookup(lookup_from(&[("KARAT_DB_MAX_CONNECTIONS", "many")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            DbConfig::from_lookup(lookup_from(&[("KARAT_DB_MAX_CONNECTIONS", "0")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            DbConfig::from_lookup(lookup_from(&[("KARAT_DB_PATH", "  ")])),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
