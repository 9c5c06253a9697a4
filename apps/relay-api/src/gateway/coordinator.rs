//! Broadcast coordinator: the single owner of the active connection set.
//!
//! Sessions never touch the set directly. They send join, leave, and
//! broadcast events through a [`Hub`] handle, and one [`Coordinator`] task
//! applies them one at a time. Every fan-out uses a non-blocking enqueue; a
//! connection whose queue cannot take the payload right away is evicted in the
//! same pass, so handling an event never waits on a slow consumer.

use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::error::HubError;

use super::connection::Connection;
use super::envelope::{Envelope, DISCONNECTED_NOTICE, JOINED_NOTICE};

/// Capacity of each coordinator event source. Senders wait when it is full.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// A join request plus the acknowledgement sent once it has been applied.
struct JoinRequest {
    conn: Connection,
    ack: oneshot::Sender<()>,
}

/// Create a connected hub handle and coordinator. Each of the three event
/// sources is bounded by `capacity`.
pub fn channel(capacity: usize) -> (Hub, Coordinator) {
    let (join_tx, join_rx) = mpsc::channel(capacity);
    let (leave_tx, leave_rx) = mpsc::channel(capacity);
    let (broadcast_tx, broadcast_rx) = mpsc::channel(capacity);

    let hub = Hub {
        join_tx,
        leave_tx,
        broadcast_tx,
    };
    let coordinator = Coordinator {
        members: HashMap::new(),
        join_rx,
        leave_rx,
        broadcast_rx,
    };
    (hub, coordinator)
}

/// Cloneable handle for submitting events to the coordinator. Store in
/// `AppState`.
#[derive(Clone)]
pub struct Hub {
    join_tx: mpsc::Sender<JoinRequest>,
    leave_tx: mpsc::Sender<String>,
    broadcast_tx: mpsc::Sender<Utf8Bytes>,
}

impl Hub {
    /// Register `conn` and wait until the coordinator has added it to the
    /// active set.
    pub async fn join(&self, conn: Connection) -> Result<(), HubError> {
        let (ack, acked) = oneshot::channel();
        self.join_tx
            .send(JoinRequest { conn, ack })
            .await
            .map_err(|_| HubError::Stopped)?;
        acked.await.map_err(|_| HubError::Stopped)
    }

    /// Ask for `id` to be removed. Removing an id that is not a member is a
    /// no-op.
    pub async fn leave(&self, id: &str) -> Result<(), HubError> {
        self.leave_tx
            .send(id.to_string())
            .await
            .map_err(|_| HubError::Stopped)
    }

    /// Submit an encoded envelope for delivery to every member. Waits while
    /// the coordinator's queue is full.
    pub async fn broadcast(&self, payload: Utf8Bytes) -> Result<(), HubError> {
        self.broadcast_tx
            .send(payload)
            .await
            .map_err(|_| HubError::Stopped)
    }
}

/// Owns the active set and processes hub events sequentially.
pub struct Coordinator {
    members: HashMap<String, Connection>,
    join_rx: mpsc::Receiver<JoinRequest>,
    leave_rx: mpsc::Receiver<String>,
    broadcast_rx: mpsc::Receiver<Utf8Bytes>,
}

impl Coordinator {
    /// Process events until every [`Hub`] handle has been dropped.
    pub async fn run(mut self) {
        tracing::info!("broadcast coordinator started");

        loop {
            tokio::select! {
                Some(JoinRequest { conn, ack }) = self.join_rx.recv() => {
                    self.handle_join(conn);
                    // The session may have given up waiting; nothing to do.
                    let _ = ack.send(());
                }
                Some(id) = self.leave_rx.recv() => self.handle_leave(&id),
                Some(payload) = self.broadcast_rx.recv() => self.handle_broadcast(payload),
                else => break,
            }
        }

        tracing::info!(members = self.members.len(), "broadcast coordinator stopped");
    }

    fn handle_join(&mut self, conn: Connection) {
        let id = conn.id().to_string();
        if self.members.insert(id.clone(), conn).is_some() {
            tracing::warn!(connection_id = %id, "duplicate connection id replaced existing member");
        }
        tracing::debug!(connection_id = %id, members = self.members.len(), "connection joined");

        if let Some(notice) = system_notice(JOINED_NOTICE) {
            self.fan_out(&notice, Some(&id));
        }
    }

    fn handle_leave(&mut self, id: &str) {
        // Dropping the connection closes its outbound queue.
        if self.members.remove(id).is_none() {
            tracing::debug!(connection_id = %id, "leave for non-member ignored");
            return;
        }
        tracing::debug!(connection_id = %id, members = self.members.len(), "connection left");

        if let Some(notice) = system_notice(DISCONNECTED_NOTICE) {
            self.fan_out(&notice, None);
        }
    }

    fn handle_broadcast(&mut self, payload: Utf8Bytes) {
        // No self-exclusion: the sender gets its own message back.
        self.fan_out(&payload, None);
    }

    /// Deliver `payload` to every member except `skip`, evicting any member
    /// whose queue cannot accept it immediately.
    fn fan_out(&mut self, payload: &Utf8Bytes, skip: Option<&str>) {
        self.members.retain(|id, conn| {
            if skip == Some(id.as_str()) {
                return true;
            }
            match conn.try_deliver(payload.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(connection_id = %id, "outbound queue full, evicting slow consumer");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(connection_id = %id, "outbound queue closed, evicting");
                    false
                }
            }
        });
    }
}

fn system_notice(content: &str) -> Option<Utf8Bytes> {
    match Envelope::system(content).encode() {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::error!(%err, "failed to encode system notice");
            None
        }
    }
}
