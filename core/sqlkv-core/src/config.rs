//! Store configuration
//!
//! Loaded from JSON (string or file) or from `SQLKV_*` environment variables.
//! Missing fields fall back to [`StoreConfig::default`].

use crate::error::{KvError, KvResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_DRIVER: &str = "SQLKV_DRIVER";
pub const ENV_DATABASE: &str = "SQLKV_DATABASE";
pub const ENV_BUSY_TIMEOUT_MS: &str = "SQLKV_BUSY_TIMEOUT_MS";
pub const ENV_STATEMENT_TIMEOUT_MS: &str = "SQLKV_STATEMENT_TIMEOUT_MS";
pub const ENV_STRING_POOL_CAPACITY: &str = "SQLKV_STRING_POOL_CAPACITY";

/// In-memory SQLite database marker.
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Registered query generator name
    pub driver: String,
    /// Database location: a file path, or `:memory:`
    pub database: String,
    /// How long SQLite waits on a locked database file
    pub busy_timeout_ms: u64,
    /// Deadline applied to contexts built with `Context::from_config`.
    /// 0 disables it.
    pub statement_timeout_ms: u64,
    /// Idle builders retained by the string pool
    pub string_pool_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            database: MEMORY_DATABASE.to_string(),
            busy_timeout_ms: 5_000,
            statement_timeout_ms: 0,
            string_pool_capacity: 64,
        }
    }
}

impl StoreConfig {
    pub fn from_json(json: &str) -> KvResult<Self> {
        let config: StoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> KvResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Defaults overridden by whichever `SQLKV_*` variables are set.
    pub fn load_from_env() -> KvResult<Self> {
        Self::default().apply_env(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `lookup` (an environment stand-in).
    pub fn apply_env<F>(mut self, lookup: F) -> KvResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(driver) = lookup(ENV_DRIVER) {
            self.driver = driver;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = database;
        }
        if let Some(raw) = lookup(ENV_BUSY_TIMEOUT_MS) {
            self.busy_timeout_ms = parse_env(ENV_BUSY_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STATEMENT_TIMEOUT_MS) {
            self.statement_timeout_ms = parse_env(ENV_STATEMENT_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STRING_POOL_CAPACITY) {
            self.string_pool_capacity = parse_env(ENV_STRING_POOL_CAPACITY, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> KvResult<()> {
        if self.driver.trim().is_empty() {
            return Err(KvError::Config("driver must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(KvError::Config("database must not be empty".to_string()));
        }
        if self.string_pool_capacity == 0 {
            return Err(KvError::Config(
                "string_pool_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.database == MEMORY_DATABASE
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_ms > 0).then(|| Duration::from_millis(self.statement_timeout_ms))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> KvResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| KvError::Config(format!("{name}: cannot parse {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.driver, "sqlite");
        assert!(config.is_in_memory());
        assert!(config.statement_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StoreConfig::from_json(r#"{"statement_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.statement_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.driver, "sqlite");
        assert_eq!(config.string_pool_capacity, 64);
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = StoreConfig::from_json("{driver:").unwrap_err();
        assert!(matches!(err, KvError::Serialization(_)));
    }

    #[test]
    fn empty_driver_rejected() {
        let err = StoreConfig::from_json(r#"{"driver": ""}"#).unwrap_err();
        assert!(matches!(err, KvError::Config(_)));
    }

    #[test]
    fn zero_pool_capacity_rejected() {
        let config = StoreConfig {
            string_pool_capacity: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(KvError::Config(_))));
    }

    #[test]
    fn from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"driver": "postgres", "database": "kv"}}"#).unwrap();
        let config = StoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.driver, "postgres");
        assert_eq!(config.database, "kv");
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StoreConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, KvError::Io { .. }));
    }

    #[test]
    fn env_overrides() {
        let config = StoreConfig::default()
            .apply_env(env(&[
                (ENV_DATABASE, "/tmp/kv.db"),
                (ENV_BUSY_TIMEOUT_MS, " 100 "),
                (ENV_STRING_POOL_CAPACITY, "8"),
            ]))
            .unwrap();
        assert_eq!(config.database, "/tmp/kv.db");
        assert_eq!(config.busy_timeout(), Duration::from_millis(100));
        assert_eq!(config.string_pool_capacity, 8);
        assert_eq!(config.driver, "sqlite");
    }

    #[test]
    fn env_unparsable_number() {
        let err = StoreConfig::default()
            .apply_env(env(&[(ENV_STATEMENT_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, KvError::Config(ref msg) if msg.contains(ENV_STATEMENT_TIMEOUT_MS)));
    }
}
