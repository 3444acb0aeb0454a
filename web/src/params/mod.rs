//! This module holds typed parameters for various endpoint inputs.
//!
//! Request bodies and query strings are deserialized straight into these
//! types, so a malformed request is rejected by axum before any handler runs.
//! Field names are camelCase on the wire.

pub(crate) mod comment;
pub(crate) mod contact;
pub(crate) mod conversation;
pub(crate) mod message;
pub(crate) mod user;
