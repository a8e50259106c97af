//! Engine configuration
//!
//! Values consumed by the cache, the lanes and the mutation executor.

use std::time::Duration;

/// Configuration for a [`WalletEngine`](super::WalletEngine)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// How long a cached balance may be served
    pub cache_ttl: Duration,

    /// Maximum number of pending requests per wallet lane
    pub lane_capacity: usize,

    /// How long a submitter waits for room in a full lane
    ///
    /// `Duration::ZERO` fails immediately.
    pub enqueue_timeout: Duration,

    /// Deadline for one whole store transaction
    pub operation_timeout: Duration,

    /// Idle period after which a lane worker retires
    ///
    /// `None` keeps every lane for the lifetime of the process.
    pub lane_idle_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(10),
            lane_capacity: 100,
            enqueue_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(5),
            lane_idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl EngineConfig {
    /// Create a config from the two values a deployment usually tunes
    ///
    /// A zero lane capacity or a zero operation timeout falls back to the
    /// default with a warning.
    pub fn new(cache_ttl: Duration, lane_capacity: usize) -> Self {
        Self::default()
            .with_cache_ttl(cache_ttl)
            .with_lane_capacity(lane_capacity)
    }

    /// Sets the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the lane capacity.
    pub fn with_lane_capacity(mut self, capacity: usize) -> Self {
        if capacity == 0 {
            let default = Self::default().lane_capacity;
            tracing::warn!(
                "Invalid lane_capacity ({}), using default ({})",
                capacity,
                default
            );
            self.lane_capacity = default;
        } else {
            self.lane_capacity = capacity;
        }
        self
    }

    /// Sets the enqueue timeout.
    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    /// Sets the operation timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            let default = Self::default().operation_timeout;
            tracing::warn!(
                "Invalid operation_timeout ({:?}), using default ({:?})",
                timeout,
                default
            );
            self.operation_timeout = default;
        } else {
            self.operation_timeout = timeout;
        }
        self
    }

    /// Sets the lane idle timeout.
    pub fn with_lane_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lane_idle_timeout = timeout;
        self
    }
}
