use axum::Router;

use crate::AppState;

/// The hub's entire HTTP surface: the WebSocket upgrade on `/ws`.
pub fn router() -> Router<AppState> {
    Router::new().merge(crate::gateway::server::router())
}
