//! WebSocket upgrade handler: turns each accepted socket into a hub session.

use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use relay_common::PrefixedId;

use crate::AppState;

use super::connection::Connection;
use super::session::Session;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let capacity = state.config.outbound_queue_capacity;
    let session = match Session::open(state.hub.clone(), Connection::generate(), capacity).await {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(%err, "could not register connection");
            return;
        }
    };

    let id = session.id().to_owned();
    tracing::info!(connection_id = %id, "hub session established");

    let (ws_tx, ws_rx) = socket.split();
    session.run(ws_rx, ws_tx).await;

    tracing::info!(connection_id = %id, "hub session ended");
}
