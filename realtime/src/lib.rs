//! Realtime fan-out of conversation updates over WebSockets.
//!
//! Connected clients receive a JSON text frame whenever something they can
//! see changes: a new message, a message state change, a read receipt, a
//! reaction, or a profile update of someone they share a conversation with.
//!
//! # Architecture
//!
//! - **Single owning control loop**: the [`Hub`] is a cloneable handle; the
//!   registry of live connections lives inside one task and is only reached
//!   through one command queue, handled in arrival order. No lock guards
//!   it.
//! - **Multi-device**: a user may hold any number of simultaneous
//!   connections and each of them receives every event addressed to the user.
//! - **Drop slow clients**: delivery never waits on a client. A full outbound
//!   queue tears the connection down in the same step; the client reconnects
//!   and reloads.
//! - **Ephemeral events**: nothing is stored for offline users.
//! - **Typed payloads**: every wire kind is a [`message::Payload`] variant.
//!
//! # Event Flow
//!
//! 1. Client opens `/ws` with a bearer token; the web layer authenticates it
//!    before upgrading
//! 2. [`session::serve`] registers a [`Connection`] and starts the read and
//!    write loops
//! 3. A write request commits and publishes an `events::DomainEvent`
//! 4. [`EventRouter`] resolves current members through a
//!    [`MembershipDirectory`] and submits an [`Event`] to the hub
//! 5. The control loop serializes the event once and queues it on every
//!    matching connection
//! 6. Each write loop flushes its queue to the socket
//!
//! # Modules
//!
//! - `connection`: connection ids, the hub-side connection and its outbound queue
//! - `registry`: the connection map and per-user index owned by the control loop
//! - `hub`: the control loop and its handle
//! - `message`: wire payloads, recipients and frame serialization
//! - `router`: domain event to hub event translation
//! - `directory`: the membership lookup the router depends on
//! - `session`: per-socket read and write loops

pub mod connection;
pub mod directory;
pub mod error;
pub mod hub;
pub mod message;
mod registry;
pub mod router;
pub mod session;

pub use connection::{Connection, ConnectionId, UserId};
pub use directory::MembershipDirectory;
pub use error::Error;
pub use hub::{Hub, HubStats};
pub use message::{Event, Payload, Recipients};
pub use router::EventRouter;
