use axum::extract::ws::Utf8Bytes;
use std::fmt;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Users are addressed by their persisted id.
pub type UserId = events::Id;

/// A serialized wire event, shared by every connection it is queued on.
pub type Frame = Utf8Bytes;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The hub-side half of one live client session.
///
/// Holds the only sender of the connection's outbound queue. Dropping it
/// (which the hub does when unregistering) closes the queue and ends the
/// write loop. It is deliberately not `Clone`.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    outbound: mpsc::Sender<Frame>,
}

/// The write-loop half: drains what the hub queued for this connection.
#[derive(Debug)]
pub struct Outbound {
    id: ConnectionId,
    receiver: mpsc::Receiver<Frame>,
}

/// Result of handing a frame to a connection without waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The outbound queue is at capacity; the client is not keeping up.
    Full,
    /// The write loop is gone.
    Closed,
}

impl Connection {
    /// Creates a connection for `user_id` with an outbound queue bounded to
    /// `capacity` frames (at least one).
    pub fn new(user_id: UserId, capacity: usize) -> (Self, Outbound) {
        Self::with_id(ConnectionId::new(), user_id, capacity)
    }

    pub(crate) fn with_id(id: ConnectionId, user_id: UserId, capacity: usize) -> (Self, Outbound) {
        let (outbound, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id,
                user_id,
                outbound,
            },
            Outbound { id, receiver },
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Queues `frame` if there is room. Never waits.
    pub(crate) fn try_deliver(&self, frame: Frame) -> Delivery {
        match self.outbound.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

impl Outbound {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits for the next frame; `None` once the hub closed the queue and
    /// every frame queued before that has been taken.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.receiver.recv().await
    }

    /// Takes the next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    /// True once the hub dropped its half and nothing is left to drain.
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed() && self.receiver.is_empty()
    }
}
