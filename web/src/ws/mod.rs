//! WebSocket endpoint and the glue between domain events and the realtime hub.
//!
//! The hub itself lives in the `realtime` crate. This module only authenticates
//! the upgrade request and supplies the database-backed membership lookup the
//! event router needs.

pub mod directory;
mod handler;

pub(crate) use handler::upgrade;

use directory::DatabaseDirectory;
use events::EventPublisher;
use realtime::{EventRouter, Hub};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Publisher whose events are fanned out by `hub` to the connected members.
pub fn event_publisher(db: Arc<DatabaseConnection>, hub: Hub) -> EventPublisher {
    let directory = Arc::new(DatabaseDirectory::new(db));
    EventPublisher::new().with_handler(Arc::new(EventRouter::new(hub, directory)))
}
