//! Event system infrastructure for WASAText.
//!
//! This crate decouples the write path (domain operations that persist
//! changes) from the realtime fan-out that tells connected clients about them.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing every change clients may want to hear about
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! Events deliberately carry *what changed*, never *who to tell*. Recipients are
//! resolved by the handler after the write committed, so membership always
//! reflects post-mutation state.
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = i64;

/// Domain events emitted once a write has been committed.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A message was sent or forwarded into a conversation.
    MessageCreated {
        conversation_id: Id,
        /// Complete serialized message detail, as returned to the sender.
        message: Value,
    },
    /// A message changed state (`sent`, `read`) or was deleted (`deleted`).
    MessageUpdated {
        conversation_id: Id,
        message_id: Id,
        state: String,
    },
    /// A member recorded a read receipt for a message.
    MessageRead {
        conversation_id: Id,
        message_id: Id,
        reader_id: Id,
        /// RFC 3339 timestamp of the receipt.
        read_at: String,
    },
    /// A member set (`Some`) or removed (`None`) their reaction on a message.
    MessageReaction {
        conversation_id: Id,
        message_id: Id,
        user_id: Id,
        emoji: Option<String>,
    },
    /// A user changed their name or profile picture.
    ProfileUpdated {
        user_id: Id,
        username: String,
        profile_picture: Option<String>,
    },
}

impl DomainEvent {
    /// The conversation the event belongs to, if it is conversation-scoped.
    pub fn conversation_id(&self) -> Option<Id> {
        match self {
            DomainEvent::MessageCreated {
                conversation_id, ..
            }
            | DomainEvent::MessageUpdated {
                conversation_id, ..
            }
            | DomainEvent::MessageRead {
                conversation_id, ..
            }
            | DomainEvent::MessageReaction {
                conversation_id, ..
            } => Some(*conversation_id),
            DomainEvent::ProfileUpdated { .. } => None,
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::MessageCreated { .. } => "MessageCreated",
            DomainEvent::MessageUpdated { .. } => "MessageUpdated",
            DomainEvent::MessageRead { .. } => "MessageRead",
            DomainEvent::MessageReaction { .. } => "MessageReaction",
            DomainEvent::ProfileUpdated { .. } => "ProfileUpdated",
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like pushing realtime
/// notifications. A handler must never fail the write that produced the
/// event, so `handle` returns nothing: failures are logged and swallowed.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
