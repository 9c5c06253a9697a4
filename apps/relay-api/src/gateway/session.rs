//! Per-connection session: adapts a duplex frame transport to hub events.
//!
//! A session joins the hub before doing anything else, then runs two loops.
//! The outbound loop drains the connection's queue onto the transport and is
//! spawned as its own task. The inbound loop reads frames, wraps each one as
//! an envelope from this connection, and submits it for broadcast. When the
//! inbound side ends (or the outbound side has closed the transport) the
//! session submits exactly one leave.

use std::fmt::Display;
use std::future::Future;

use axum::extract::ws::{Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::error::HubError;

use super::connection::Connection;
use super::coordinator::Hub;
use super::envelope::Envelope;

/// A joined connection that has not started its loops yet.
pub struct Session {
    id: String,
    hub: Hub,
    outbound: mpsc::Receiver<Utf8Bytes>,
}

impl Session {
    /// Register a new connection with the hub. Returns once the coordinator
    /// has made it a member.
    pub async fn open(hub: Hub, id: String, queue_capacity: usize) -> Result<Self, HubError> {
        let (conn, outbound) = Connection::new(id.clone(), queue_capacity);
        hub.join(conn).await?;
        Ok(Self { id, hub, outbound })
    }

    /// The connection id this session registered under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run both loops until the connection is finished.
    ///
    /// `stream` and `sink` are the read and write halves of the transport.
    pub async fn run<S, E, K>(self, stream: S, sink: K)
    where
        S: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
        K: Sink<Message> + Unpin + Send + 'static,
        K::Error: Display,
    {
        let Self { id, hub, outbound } = self;

        let writer = tokio::spawn(write_loop(id.clone(), outbound, sink));
        read_loop(&id, &hub, stream, writer).await;

        if let Err(err) = hub.leave(&id).await {
            tracing::debug!(connection_id = %id, %err, "leave not delivered");
        }
    }
}

/// Relay inbound frames until the transport fails or `closed` resolves.
async fn read_loop<S, E, F>(id: &str, hub: &Hub, mut stream: S, closed: F)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    F: Future,
{
    tokio::pin!(closed);

    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = &mut closed => {
                tracing::debug!(connection_id = %id, "transport closed by outbound side");
                break;
            }
        };

        let content = match frame {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(err)) => {
                tracing::debug!(connection_id = %id, %err, "ws read error");
                break;
            }
        };

        // Client text is opaque: it is never parsed as an envelope.
        let payload = match Envelope::relayed(id, content).encode() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(connection_id = %id, %err, "dropping unencodable frame");
                continue;
            }
        };

        if hub.broadcast(payload).await.is_err() {
            break;
        }
    }
}

/// Write queued payloads as text frames. Once the queue is closed, send a
/// close frame and shut the sink.
async fn write_loop<K>(id: String, mut outbound: mpsc::Receiver<Utf8Bytes>, mut sink: K)
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(err) = sink.send(Message::Text(payload)).await {
            // Surfaced to the inbound side as a read failure.
            tracing::debug!(connection_id = %id, %err, "ws write error");
            return;
        }
    }

    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
}
