use crate::gateway::connection::OUTBOUND_QUEUE_CAPACITY;
use crate::gateway::coordinator::EVENT_QUEUE_CAPACITY;

/// Relay API configuration. Only the port comes from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Capacity of each connection's outbound queue. A connection whose queue
    /// is full when the coordinator delivers to it is evicted. Always
    /// [`OUTBOUND_QUEUE_CAPACITY`] outside tests.
    pub outbound_queue_capacity: usize,
    /// Capacity of each coordinator event source (join, leave, broadcast).
    /// Senders wait when it is full. Always [`EVENT_QUEUE_CAPACITY`] outside
    /// tests.
    pub event_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 12345,
            outbound_queue_capacity: OUTBOUND_QUEUE_CAPACITY,
            event_queue_capacity: EVENT_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only `PORT` is read; a missing or unparsable value falls back to the
    /// default. Queue capacities are fixed.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            ..defaults
        }
    }
}
