//! Pool configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tarn_core::{Result, TarnError};

/// Configuration for a connection pool
///
/// Controls how many connections are created up front, how many idle
/// connections are kept, and how long an idle connection stays reusable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of connections created when the pool is built
    initial_size: usize,
    /// Maximum number of idle connections kept for reuse
    capacity: usize,
    /// Idle timeout in milliseconds; 0 disables eviction
    idle_timeout_ms: u64,
}

impl PoolConfig {
    /// Create a new pool configuration
    ///
    /// Values are checked by [`PoolConfig::validate`], which the pool runs
    /// before creating any connection.
    pub fn new(initial_size: usize, capacity: usize) -> Self {
        Self {
            initial_size,
            capacity,
            idle_timeout_ms: 0,
        }
    }

    /// Parse and validate a configuration from TOML
    ///
    /// ```
    /// use tarn_pool::PoolConfig;
    ///
    /// let config = PoolConfig::from_toml_str("initial_size = 2\ncapacity = 5").unwrap();
    /// assert_eq!(config.capacity(), 5);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|e| TarnError::Configuration(format!("invalid pool config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the idle timeout in milliseconds
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Set the idle timeout, `Duration::ZERO` disables it
    ///
    /// Sub-millisecond timeouts round up to 1ms so they never read as disabled.
    pub fn with_idle_timeout(self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            return self.with_idle_timeout_ms(0);
        }
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.with_idle_timeout_ms(ms.max(1))
    }

    /// Get the number of connections created up front
    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    /// Get the maximum number of idle connections
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the idle timeout, `None` when disabled
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }

    /// Check the capacity bounds
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(TarnError::Configuration(
                "capacity must be greater than 0".into(),
            ));
        }
        if self.initial_size > self.capacity {
            return Err(TarnError::Configuration(format!(
                "initial_size ({}) cannot exceed capacity ({})",
                self.initial_size, self.capacity
            )));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    /// Create a default pool configuration
    ///
    /// Defaults:
    /// - initial_size: 0
    /// - capacity: 10
    /// - idle_timeout: disabled
    fn default() -> Self {
        Self::new(0, 10)
    }
}
