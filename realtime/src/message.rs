use crate::connection::{Frame, UserId};
use crate::error::Error;
use serde::Serialize;
use serde_json::Value;

/// Conversations are addressed by their persisted id.
pub type ConversationId = events::Id;

/// Trait for getting the wire event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Kind-specific body of a wire event. The kind itself is written next to it
/// as `"type"`, see [`EventType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Full message detail, exactly as the sender got it back.
    NewMessage(Value),
    #[serde(rename_all = "camelCase")]
    MessageUpdate { message_id: events::Id, state: String },
    #[serde(rename_all = "camelCase")]
    MessageRead {
        message_id: events::Id,
        user_id: UserId,
        read_at: String,
    },
    #[serde(rename_all = "camelCase")]
    MessageReaction {
        message_id: events::Id,
        user_id: UserId,
        emoji: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ProfileUpdate {
        user_id: UserId,
        username: String,
        profile_picture: Option<String>,
    },
}

impl EventType for Payload {
    fn event_type(&self) -> &'static str {
        match self {
            Payload::NewMessage(_) => "new_message",
            Payload::MessageUpdate { .. } => "message_update",
            Payload::MessageRead { .. } => "message_read",
            Payload::MessageReaction { .. } => "message_reaction",
            Payload::ProfileUpdate { .. } => "profile_update",
        }
    }
}

/// Who an event is delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// Every live connection.
    Broadcast,
    /// Every live connection owned by one of these users. An empty list
    /// reaches nobody.
    Users(Vec<UserId>),
}

impl Recipients {
    /// Explicit recipient list, sorted and without duplicates.
    pub fn users<I>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = UserId>,
    {
        let mut user_ids: Vec<UserId> = user_ids.into_iter().collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        Recipients::Users(user_ids)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Recipients::Users(user_ids) if user_ids.is_empty())
    }
}

/// An immutable fan-out notification, ready to hand to the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    conversation_id: Option<ConversationId>,
    payload: Payload,
    recipients: Recipients,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<ConversationId>,
    payload: &'a Payload,
}

impl Event {
    pub fn new(payload: Payload, recipients: Recipients) -> Self {
        Self {
            conversation_id: None,
            payload,
            recipients,
        }
    }

    pub fn in_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn recipients(&self) -> &Recipients {
        &self.recipients
    }

    /// Serializes the client-visible part of the event. Recipients stay
    /// server-side.
    pub fn to_frame(&self) -> Result<Frame, Error> {
        let json = serde_json::to_string(&WireEvent {
            kind: self.payload.event_type(),
            conversation_id: self.conversation_id,
            payload: &self.payload,
        })?;
        Ok(Frame::from(json))
    }
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
