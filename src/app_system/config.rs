use std::time::Duration;

use crate::lifecycle::NumberingStrategy;

/// Runtime settings of the order system.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Mailbox size of every store actor.
    pub actor_buffer_size: usize,
    /// Capacity of the order existence broadcast channels.
    pub existence_capacity: usize,
    /// Undelivered listings a live feed may hold.
    pub live_feed_buffer: usize,
    pub numbering: NumberingStrategy,
    /// Undo inventory steps and cancel the order row when creation fails halfway.
    pub compensate_partial_failures: bool,
    pub operations_email: Option<String>,
    pub shutdown_timeout_ms: u64,
}

impl SystemConfig {
    /// Reads `WAREHOUSE_ORDERS_*` variables, keeping the default for anything
    /// missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            actor_buffer_size: env_or("WAREHOUSE_ORDERS_ACTOR_BUFFER", defaults.actor_buffer_size),
            existence_capacity: env_or("WAREHOUSE_ORDERS_EXISTENCE_CAPACITY", defaults.existence_capacity),
            live_feed_buffer: env_or("WAREHOUSE_ORDERS_LIVE_FEED_BUFFER", defaults.live_feed_buffer),
            numbering: env_or("WAREHOUSE_ORDERS_NUMBERING", defaults.numbering),
            compensate_partial_failures: env_or("WAREHOUSE_ORDERS_COMPENSATE", defaults.compensate_partial_failures),
            operations_email: std::env::var("WAREHOUSE_ORDERS_OPERATIONS_EMAIL")
                .ok()
                .filter(|email| !email.is_empty())
                .or(defaults.operations_email),
            shutdown_timeout_ms: env_or("WAREHOUSE_ORDERS_SHUTDOWN_TIMEOUT_MS", defaults.shutdown_timeout_ms),
        }
    }

    pub fn with_numbering(mut self, numbering: NumberingStrategy) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn with_compensation(mut self) -> Self {
        self.compensate_partial_failures = true;
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            actor_buffer_size: 32,
            existence_capacity: 256,
            live_feed_buffer: 16,
            numbering: NumberingStrategy::Scan,
            compensate_partial_failures: false,
            operations_email: None,
            shutdown_timeout_ms: 5000,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
