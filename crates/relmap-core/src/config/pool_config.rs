//! Connection pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default ceiling on concurrently open connections.
pub const DEFAULT_MAX_OPEN_CONNECTIONS: usize = 64;

/// Default SQLite busy timeout in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Configuration for the connection pool.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of physical connections open at once. Default: 64.
    /// 0 is treated as the default.
    pub max_open_connections: Option<usize>,
    /// How long a statement waits on a locked database. Default: 5000 ms.
    pub busy_timeout_ms: Option<u64>,
    /// How long a caller waits for a free connection. Default: forever.
    pub acquire_timeout_ms: Option<u64>,
}

impl PoolConfig {
    /// Returns the effective pool ceiling, defaulting to 64.
    pub fn effective_max_open_connections(&self) -> usize {
        match self.max_open_connections {
            Some(0) | None => DEFAULT_MAX_OPEN_CONNECTIONS,
            Some(n) => n,
        }
    }

    /// Returns the effective busy timeout, defaulting to 5000 ms.
    pub fn effective_busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Returns the acquire timeout, if any.
    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_max_open_connections(mut self, max: usize) -> Self {
        self.max_open_connections = Some(max);
        self
    }
}
