//! Registry-side handle for one live connection.

use axum::extract::ws::Utf8Bytes;
use relay_common::id::prefix;
use relay_common::PrefixedId;
use tokio::sync::mpsc;

/// Capacity of each connection's outbound queue. A connection that falls this
/// far behind is evicted.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// The coordinator's view of a live connection: its id and the producer side
/// of its outbound queue.
///
/// The coordinator holds the only `Connection` for an id, so dropping it
/// closes the queue and the session's outbound loop winds down.
#[derive(Debug)]
pub struct Connection {
    id: String,
    outbound: mpsc::Sender<Utf8Bytes>,
}

impl PrefixedId for Connection {
    const PREFIX: &'static str = prefix::CONNECTION;
}

impl Connection {
    /// Create a connection with a bounded outbound queue. Returns the consumer
    /// side, which belongs to the session's outbound loop.
    pub fn new(id: String, capacity: usize) -> (Self, mpsc::Receiver<Utf8Bytes>) {
        let (outbound, rx) = mpsc::channel(capacity);
        (Self { id, outbound }, rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Enqueue without waiting. Fails if the queue is full or its consumer is
    /// gone.
    pub(crate) fn try_deliver(
        &self,
        payload: Utf8Bytes,
    ) -> Result<(), mpsc::error::TrySendError<Utf8Bytes>> {
        self.outbound.try_send(payload)
    }
}
