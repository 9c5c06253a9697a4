pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

use config::Config;
use gateway::coordinator::Hub;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Hub,
}

impl AppState {
    /// Build the state and spawn the broadcast coordinator that backs it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: Config) -> Self {
        let (hub, coordinator) = gateway::coordinator::channel(config.event_queue_capacity);
        tokio::spawn(coordinator.run());
        Self {
            config: Arc::new(config),
            hub,
        }
    }
}
