pub mod prelude;

pub mod comments;
pub mod contacts;
pub mod conversation_members;
pub mod conversations;
pub mod jwt;
pub mod message_format;
pub mod message_reads;
pub mod message_state;
pub mod messages;
pub mod reactions;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = i64;
