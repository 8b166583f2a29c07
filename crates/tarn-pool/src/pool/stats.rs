//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Statistics about a connection pool's current state
///
/// Counters are read one at a time without a common lock, so a snapshot
/// taken under concurrent use is approximate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Number of idle connections in the pool
    idle: usize,
    /// Maximum number of idle connections
    capacity: usize,
    /// Number of connections currently handed out
    in_use: usize,
    /// Connections created by the factory over the pool's lifetime
    created: u64,
    /// Connections evicted because they sat idle too long
    expired: u64,
    /// Connections discarded because the pool was full on return
    overflowed: u64,
}

impl PoolStats {
    /// Create new pool statistics
    pub fn new(
        idle: usize,
        capacity: usize,
        in_use: usize,
        created: u64,
        expired: u64,
        overflowed: u64,
    ) -> Self {
        Self {
            idle,
            capacity,
            in_use,
            created,
            expired,
            overflowed,
        }
    }

    /// Get the number of idle connections
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Get the idle capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of connections handed out
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Get the number of connections the factory has created
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Get the number of idle-timeout evictions
    pub fn expired(&self) -> u64 {
        self.expired
    }

    /// Get the number of connections discarded on a full pool
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    /// Check if the idle buffer is at capacity
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.idle >= self.capacity
    }
}
