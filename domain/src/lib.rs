//! Business rules of WASAText.
//!
//! Every write goes through this crate: it validates the request against the
//! current state, persists through `entity_api`, and once the write has
//! committed publishes an `events::DomainEvent` describing what changed.
//! Who gets told about it is not decided here.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    comments, contacts, conversation_members, conversations, message_reads, messages, reactions,
    users, Id,
};
pub use entity::{message_format::MessageFormat, message_state::MessageState};

pub mod comment;
pub mod contact;
pub mod conversation;
pub mod error;
pub mod jwt;
pub mod message;
pub mod user;
