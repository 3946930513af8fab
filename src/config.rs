//! Configuration Module
//!
//! Cache construction options and loading them from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheValue;
use crate::error::CacheError;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// == Log Level ==
/// Verbosity of the cache's internal diagnostics.
///
/// An event is emitted when its level is at least as severe as the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Returns true if an event at `level` passes this verbosity.
    pub fn enables(self, level: LogLevel) -> bool {
        level >= self
    }
}

impl FromStr for LogLevel {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(CacheError::InvalidArgument(format!(
                "unknown log level {:?}, expected one of debug, info, warn, error",
                other
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

// == Eviction Hook ==
/// Callback invoked as `(key, value)` when an item leaves the cache through
/// expiration or capacity eviction. `value` is `None` when it was not resolved.
///
/// Hooks run while the cache's exclusive lock is held and must not call back
/// into the same cache.
pub type EvictionHook = Arc<dyn Fn(&str, Option<CacheValue>) + Send + Sync>;

// == Cache Options ==
/// Options recognised when constructing a cache.
#[derive(Clone)]
pub struct CacheOptions {
    /// Verbosity of internal diagnostics
    pub log_level: LogLevel,
    /// Optional eviction notification
    pub eviction_hook: Option<EvictionHook>,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            eviction_hook: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("log_level", &self.log_level)
            .field("eviction_hook", &self.eviction_hook.is_some())
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the callback invoked whenever an item is expired or evicted.
    pub fn with_eviction_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, Option<CacheValue>) + Send + Sync + 'static,
    {
        self.eviction_hook = Some(Arc::new(hook));
        self
    }

    /// Sets how often the background sweep runs.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

// == Config ==
/// Cache configuration loaded from the environment.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Verbosity of internal diagnostics
    pub log_level: LogLevel,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// TTL in seconds applied by callers that have no TTL of their own
    pub default_ttl: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_LOG_LEVEL` - One of debug, info, warn, error (default: warn)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            log_level: env::var("CACHE_LOG_LEVEL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_level),
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
            default_ttl: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
        }
    }

    /// Builds construction options from this configuration.
    pub fn options(&self) -> CacheOptions {
        CacheOptions::new()
            .with_log_level(self.log_level)
            .with_sweep_interval(Duration::from_secs(self.sweep_interval))
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1000,
            log_level: LogLevel::Warn,
            sweep_interval: 60,
            default_ttl: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.sweep_interval, 60);
        assert_eq!(config.default_ttl, 300);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_LOG_LEVEL");
        env::remove_var("CACHE_SWEEP_INTERVAL");
        env::remove_var("CACHE_DEFAULT_TTL");

        let config = Config::from_env();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_options() {
        let config = Config {
            capacity: 10,
            log_level: LogLevel::Debug,
            sweep_interval: 5,
            default_ttl: 30,
        };

        let options = config.options();
        assert_eq!(options.log_level, LogLevel::Debug);
        assert_eq!(options.sweep_interval, Duration::from_secs(5));
        assert!(options.eviction_hook.is_none());
        assert_eq!(config.default_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!(matches!(
            "verbose".parse::<LogLevel>(),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_log_level_enables() {
        assert!(LogLevel::Debug.enables(LogLevel::Debug));
        assert!(LogLevel::Debug.enables(LogLevel::Error));
        assert!(LogLevel::Warn.enables(LogLevel::Error));
        assert!(!LogLevel::Warn.enables(LogLevel::Info));
        assert!(!LogLevel::Error.enables(LogLevel::Warn));
    }

    #[test]
    fn test_log_level_display_roundtrip() {
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_options_builder() {
        let options = CacheOptions::new()
            .with_log_level(LogLevel::Error)
            .with_sweep_interval(Duration::from_millis(50))
            .with_eviction_hook(|_, _| {});

        assert_eq!(options.log_level, LogLevel::Error);
        assert_eq!(options.sweep_interval, Duration::from_millis(50));
        assert!(options.eviction_hook.is_some());
        assert!(format!("{:?}", options).contains("eviction_hook: true"));
    }
}
