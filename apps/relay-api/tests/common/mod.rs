use std::net::SocketAddr;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use relay_api::config::Config;
use relay_api::AppState;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Small queues so slow-consumer tests don't need thousands of messages.
pub fn test_config() -> Config {
    Config {
        port: 0,
        outbound_queue_capacity: 16,
        event_queue_capacity: 16,
    }
}

/// Build app state with a running coordinator.
pub fn test_state(config: Config) -> AppState {
    AppState::start(config)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background.
pub async fn start_ws_server(config: Config) -> SocketAddr {
    let app = relay_api::routes::router().with_state(test_state(config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{addr}/ws");
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws_stream
}

/// Read the next text frame and parse it as JSON.
pub async fn next_json(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timeout waiting for message")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            Message::Text(text) => return serde_json::from_str(&text).expect("parse envelope"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text frame, got: {other:?}"),
        }
    }
}
