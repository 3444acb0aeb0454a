use crate::directory::MembershipDirectory;
use crate::error::Error;
use crate::hub::Hub;
use crate::message::{Event, EventType, Payload, Recipients};
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Turns committed domain events into hub events.
///
/// Recipients are looked up when the event is handled, which is after the
/// write that produced it committed, so they reflect post-mutation
/// membership. Nothing that goes wrong here reaches the write path: failures
/// are logged and the event is dropped.
pub struct EventRouter {
    hub: Hub,
    directory: Arc<dyn MembershipDirectory>,
}

impl EventRouter {
    pub fn new(hub: Hub, directory: Arc<dyn MembershipDirectory>) -> Self {
        Self { hub, directory }
    }

    /// Builds the hub event for `event` with its recipients resolved.
    pub async fn route(&self, event: &DomainEvent) -> Result<Event, Error> {
        let payload = payload_for(event);

        match event.conversation_id() {
            Some(conversation_id) => {
                let members = self.directory.conversation_members(conversation_id).await?;
                Ok(Event::new(payload, Recipients::users(members)).in_conversation(conversation_id))
            }
            None => {
                let DomainEvent::ProfileUpdated { user_id, .. } = event else {
                    return Ok(Event::new(payload, Recipients::users(Vec::new())));
                };
                let recipients = self.profile_audience(*user_id).await?;
                Ok(Event::new(payload, recipients))
            }
        }
    }

    /// The user's own devices plus everyone they share a conversation with.
    async fn profile_audience(&self, user_id: events::Id) -> Result<Recipients, Error> {
        let mut user_ids = vec![user_id];

        for conversation_id in self.directory.user_conversations(user_id).await? {
            match self.directory.conversation_members(conversation_id).await {
                Ok(members) => user_ids.extend(members),
                Err(e) if e.is_not_found() => {
                    debug!("Conversation {conversation_id} vanished while resolving profile update");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Recipients::users(user_ids))
    }
}

fn payload_for(event: &DomainEvent) -> Payload {
    match event {
        DomainEvent::MessageCreated { message, .. } => Payload::NewMessage(message.clone()),
        DomainEvent::MessageUpdated {
            message_id, state, ..
        } => Payload::MessageUpdate {
            message_id: *message_id,
            state: state.clone(),
        },
        DomainEvent::MessageRead {
            message_id,
            reader_id,
            read_at,
            ..
        } => Payload::MessageRead {
            message_id: *message_id,
            user_id: *reader_id,
            read_at: read_at.clone(),
        },
        DomainEvent::MessageReaction {
            message_id,
            user_id,
            emoji,
            ..
        } => Payload::MessageReaction {
            message_id: *message_id,
            user_id: *user_id,
            emoji: emoji.clone(),
        },
        DomainEvent::ProfileUpdated {
            user_id,
            username,
            profile_picture,
        } => Payload::ProfileUpdate {
            user_id: *user_id,
            username: username.clone(),
            profile_picture: profile_picture.clone(),
        },
    }
}

#[async_trait]
impl EventHandler for EventRouter {
    async fn handle(&self, event: &DomainEvent) {
        debug!("Routing {} event", event.name());

        let routed = match self.route(event).await {
            Ok(routed) => routed,
            Err(e) if e.is_not_found() => {
                debug!("Dropping {} event: {e}", event.name());
                return;
            }
            Err(e) => {
                warn!("Dropping {} event: {e}", event.name());
                return;
            }
        };

        if routed.recipients().is_empty() {
            debug!("No recipients for {} event", routed.event_type());
            return;
        }

        if let Err(e) = self.hub.submit(routed).await {
            warn!("Failed to submit {} event: {e}", event.name());
        }
    }
}
