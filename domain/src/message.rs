use crate::conversation::require_member;
use crate::error::Error;
use crate::{comments, messages, reactions, users, Id, MessageFormat, MessageState};
use entity_api::message::NewMessage;
use entity_api::{comment, message, message_read, reaction};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

const MAX_EMOJI_LEN: usize = 16;

/// State name published when a message is removed. Deleted messages are gone
/// from storage, so this never appears on a `messages` row.
pub const DELETED_STATE: &str = "deleted";

/// What a client supplies to send a message.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageParams {
    pub content: String,
    #[serde(default)]
    pub format: MessageFormat,
    pub reply_to: Option<Id>,
}

/// The message a reply points at, reduced to what a client shows inline.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub message_id: Id,
    pub sender_name: String,
    pub content: String,
    pub format: MessageFormat,
}

/// A message together with everything a client renders next to it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub message: messages::Model,
    pub sender_name: String,
    pub sender_picture: Option<String>,
    pub reactions: Vec<reactions::Model>,
    pub comments: Vec<comments::Model>,
    pub comment_count: usize,
    /// Ids of the members holding a read receipt.
    pub read_by: Vec<Id>,
    pub reply_preview: Option<ReplyPreview>,
}

impl MessageDetail {
    /// The message alone, with no sender name or related rows filled in.
    fn bare(message: messages::Model) -> Self {
        Self {
            message,
            sender_name: String::new(),
            sender_picture: None,
            reactions: Vec::new(),
            comments: Vec::new(),
            comment_count: 0,
            read_by: Vec::new(),
            reply_preview: None,
        }
    }
}

/// Sends a message into a conversation the sender belongs to.
pub async fn send(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    sender_id: Id,
    conversation_id: Id,
    params: MessageParams,
) -> Result<MessageDetail, Error> {
    require_member(db, conversation_id, sender_id).await?;

    if params.content.trim().is_empty() {
        debug!("Rejected empty message from user {sender_id}");
        return Err(Error::invalid());
    }

    if let Some(reply_to) = params.reply_to {
        message::find_in_conversation(db, conversation_id, reply_to)
            .await
            .map_err(|_| {
                debug!("Reply target {reply_to} is not in conversation {conversation_id}");
                Error::invalid()
            })?;
    }

    let created = message::create(
        db,
        NewMessage {
            conversation_id,
            sender_id,
            content: params.content,
            format: params.format,
            reply_to: params.reply_to,
            is_forwarded: false,
        },
    )
    .await?;

    publish_created(db, event_publisher, created).await
}

/// Deletes a message. Only its sender may do so.
pub async fn delete(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
) -> Result<(), Error> {
    require_member(db, conversation_id, user_id).await?;
    let target = message::find_in_conversation(db, conversation_id, message_id).await?;

    if target.sender_id != user_id {
        warn!("User {user_id} tried to delete message {message_id} sent by {}", target.sender_id);
        return Err(Error::forbidden());
    }

    message::delete(db, message_id).await?;

    event_publisher
        .publish(DomainEvent::MessageUpdated {
            conversation_id,
            message_id,
            state: DELETED_STATE.to_string(),
        })
        .await;

    Ok(())
}

/// Copies a message into `target_conversation_id` as a new, forwarded message
/// from `user_id`, who must belong to both conversations.
pub async fn forward(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
    target_conversation_id: Id,
) -> Result<MessageDetail, Error> {
    require_member(db, conversation_id, user_id).await?;
    let original = message::find_in_conversation(db, conversation_id, message_id).await?;
    require_member(db, target_conversation_id, user_id).await?;

    let forwarded = message::create(
        db,
        NewMessage {
            conversation_id: target_conversation_id,
            sender_id: user_id,
            content: original.content,
            format: original.format,
            reply_to: None,
            is_forwarded: true,
        },
    )
    .await?;

    publish_created(db, event_publisher, forwarded).await
}

/// Sets the caller's reaction on a message, replacing any previous one.
pub async fn react(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
    emoji: &str,
) -> Result<reactions::Model, Error> {
    require_member(db, conversation_id, user_id).await?;
    message::find_in_conversation(db, conversation_id, message_id).await?;

    let emoji = emoji.trim();
    if emoji.is_empty() || emoji.chars().count() > MAX_EMOJI_LEN {
        return Err(Error::invalid());
    }

    let reaction = reaction::upsert(db, message_id, user_id, emoji).await?;

    event_publisher
        .publish(DomainEvent::MessageReaction {
            conversation_id,
            message_id,
            user_id,
            emoji: Some(reaction.emoji.clone()),
        })
        .await;

    Ok(reaction)
}

/// Removes the caller's reaction. NotFound when there was none.
pub async fn unreact(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
) -> Result<(), Error> {
    require_member(db, conversation_id, user_id).await?;
    message::find_in_conversation(db, conversation_id, message_id).await?;

    reaction::remove(db, message_id, user_id).await?;

    event_publisher
        .publish(DomainEvent::MessageReaction {
            conversation_id,
            message_id,
            user_id,
            emoji: None,
        })
        .await;

    Ok(())
}

/// Records that `user_id` has read a message and returns the message as it
/// stands afterwards.
///
/// Reading one's own message changes nothing. A repeated receipt is kept as
/// first recorded and publishes nothing. Once every other current member has
/// a receipt the message moves to `read`.
pub async fn mark_read(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
) -> Result<messages::Model, Error> {
    require_member(db, conversation_id, user_id).await?;
    let target = message::find_in_conversation(db, conversation_id, message_id).await?;

    if target.sender_id == user_id {
        return Ok(target);
    }

    let (receipt, newly_read) = message_read::mark(db, message_id, user_id).await?;
    if !newly_read {
        return Ok(target);
    }

    event_publisher
        .publish(DomainEvent::MessageRead {
            conversation_id,
            message_id,
            reader_id: user_id,
            read_at: receipt.read_at.to_rfc3339(),
        })
        .await;

    // The receipt is committed; past this point failures are logged, not returned.
    if target.state == MessageState::Read {
        return Ok(target);
    }
    match read_by_everyone(db, &target).await {
        Ok(true) => {}
        Ok(false) => return Ok(target),
        Err(err) => {
            warn!("Could not count readers of message {message_id}: {err}");
            return Ok(target);
        }
    }

    let updated = match message::update_state(db, message_id, MessageState::Read).await {
        Ok(updated) => updated,
        Err(err) => {
            warn!("Could not mark message {message_id} as read: {err}");
            return Ok(target);
        }
    };
    debug!("Message {message_id} read by every member of conversation {conversation_id}");

    event_publisher
        .publish(DomainEvent::MessageUpdated {
            conversation_id,
            message_id,
            state: updated.state.to_string(),
        })
        .await;

    Ok(updated)
}

async fn read_by_everyone(db: &DatabaseConnection, target: &messages::Model) -> Result<bool, Error> {
    let readers = message_read::reader_ids(db, target.id).await?;
    let members = entity_api::conversation_member::member_ids(db, target.conversation_id).await?;

    Ok(members
        .iter()
        .filter(|member| **member != target.sender_id)
        .all(|member| readers.contains(member)))
}

async fn publish_created(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    created: messages::Model,
) -> Result<MessageDetail, Error> {
    let conversation_id = created.conversation_id;
    let message_id = created.id;
    // The message is already stored; a failed lookup only thins the detail.
    let detail = match details(db, vec![created.clone()]).await {
        Ok(mut details) => details.pop().unwrap_or_else(|| MessageDetail::bare(created)),
        Err(err) => {
            warn!("Could not load the detail of message {message_id}: {err}");
            MessageDetail::bare(created)
        }
    };

    match serde_json::to_value(&detail) {
        Ok(message) => {
            event_publisher
                .publish(DomainEvent::MessageCreated {
                    conversation_id,
                    message,
                })
                .await
        }
        Err(err) => warn!("Could not serialize message {}: {err}", detail.message.id),
    }

    Ok(detail)
}

/// Expands `messages` into details, keeping their order. Related rows are
/// loaded with one query per kind rather than per message.
pub(crate) async fn details(
    db: &DatabaseConnection,
    messages: Vec<messages::Model>,
) -> Result<Vec<MessageDetail>, Error> {
    let ids: Vec<Id> = messages.iter().map(|m| m.id).collect();

    let reply_ids: Vec<Id> = messages.iter().filter_map(|m| m.reply_to).collect();
    let replies: HashMap<Id, messages::Model> = message::find_by_ids(db, &reply_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut sender_ids: Vec<Id> = messages
        .iter()
        .chain(replies.values())
        .map(|m| m.sender_id)
        .collect();
    sender_ids.sort_unstable();
    sender_ids.dedup();
    let senders: HashMap<Id, users::Model> = entity_api::user::find_by_ids(db, &sender_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut reactions_by_message: HashMap<Id, Vec<reactions::Model>> = HashMap::new();
    for r in reaction::find_by_messages(db, &ids).await? {
        reactions_by_message.entry(r.message_id).or_default().push(r);
    }

    let mut comments_by_message: HashMap<Id, Vec<comments::Model>> = HashMap::new();
    for c in comment::find_by_messages(db, &ids).await? {
        comments_by_message.entry(c.message_id).or_default().push(c);
    }

    let mut readers_by_message: HashMap<Id, Vec<Id>> = HashMap::new();
    for receipt in message_read::find_by_messages(db, &ids).await? {
        readers_by_message
            .entry(receipt.message_id)
            .or_default()
            .push(receipt.user_id);
    }

    let sender_name = |id: Id| {
        senders
            .get(&id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    };

    Ok(messages
        .into_iter()
        .map(|message| {
            let reply_preview = message
                .reply_to
                .and_then(|id| replies.get(&id))
                .map(|reply| ReplyPreview {
                    message_id: reply.id,
                    sender_name: sender_name(reply.sender_id),
                    content: reply.content.clone(),
                    format: reply.format,
                });
            let comments = comments_by_message.remove(&message.id).unwrap_or_default();

            MessageDetail {
                sender_name: sender_name(message.sender_id),
                sender_picture: senders
                    .get(&message.sender_id)
                    .and_then(|u| u.profile_picture.clone()),
                reactions: reactions_by_message.remove(&message.id).unwrap_or_default(),
                comment_count: comments.len(),
                comments,
                read_by: readers_by_message.remove(&message.id).unwrap_or_default(),
                reply_preview,
                message,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::test_support::{setup_db, Recorder};

    struct Chat {
        alice: Id,
        bob: Id,
        carol: Id,
        group: Id,
    }

    async fn group_chat(db: &DatabaseConnection) -> Chat {
        let alice = entity_api::user::create(db, "alice").await.unwrap().id;
        let bob = entity_api::user::create(db, "bob").await.unwrap().id;
        let carol = entity_api::user::create(db, "carol").await.unwrap().id;
        let group = entity_api::conversation::create(db, "trio", true, &[alice, bob, carol])
            .await
            .unwrap()
            .id;
        Chat {
            alice,
            bob,
            carol,
            group,
        }
    }

    fn text(content: &str) -> MessageParams {
        MessageParams {
            content: content.to_string(),
            format: MessageFormat::Text,
            reply_to: None,
        }
    }

    fn kind(err: Error) -> EntityErrorKind {
        match err.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(kind)) => kind,
            other => panic!("expected an entity error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_publishes_the_full_detail() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;

        let sent = send(&db, &publisher, chat.alice, chat.group, text("hi all")).await?;

        assert_eq!(sent.sender_name, "alice");
        assert_eq!(sent.message.state, MessageState::Sent);
        assert_eq!(sent.comment_count, 0);
        match recorder.take().as_slice() {
            [DomainEvent::MessageCreated {
                conversation_id,
                message,
            }] => {
                assert_eq!(*conversation_id, chat.group);
                assert_eq!(message["message"]["content"], "hi all");
                assert_eq!(message["senderName"], "alice");
            }
            other => panic!("unexpected events {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn send_rejects_outsiders_and_blank_content() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let dave = entity_api::user::create(&db, "dave").await?.id;

        let outsider = send(&db, &publisher, dave, chat.group, text("hello?")).await;
        let blank = send(&db, &publisher, chat.bob, chat.group, text("   ")).await;

        assert_eq!(kind(outsider.unwrap_err()), EntityErrorKind::Forbidden);
        assert_eq!(kind(blank.unwrap_err()), EntityErrorKind::Invalid);
        assert!(recorder.take().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn reply_carries_a_preview_and_must_stay_in_the_conversation() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, _recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let direct =
            entity_api::conversation::create(&db, "", false, &[chat.alice, chat.bob]).await?;

        let question = send(&db, &publisher, chat.alice, chat.group, text("lunch?")).await?;
        let answer = send(
            &db,
            &publisher,
            chat.bob,
            chat.group,
            MessageParams {
                reply_to: Some(question.message.id),
                ..text("yes")
            },
        )
        .await?;
        let misplaced = send(
            &db,
            &publisher,
            chat.bob,
            direct.id,
            MessageParams {
                reply_to: Some(question.message.id),
                ..text("yes")
            },
        )
        .await;

        assert_eq!(
            answer.reply_preview,
            Some(ReplyPreview {
                message_id: question.message.id,
                sender_name: "alice".to_string(),
                content: "lunch?".to_string(),
                format: MessageFormat::Text,
            })
        );
        assert_eq!(kind(misplaced.unwrap_err()), EntityErrorKind::Invalid);

        Ok(())
    }

    #[tokio::test]
    async fn only_the_sender_may_delete() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let sent = send(&db, &publisher, chat.alice, chat.group, text("oops")).await?;
        recorder.take();

        let by_bob = delete(&db, &publisher, chat.bob, chat.group, sent.message.id).await;
        assert_eq!(kind(by_bob.unwrap_err()), EntityErrorKind::Forbidden);

        delete(&db, &publisher, chat.alice, chat.group, sent.message.id).await?;

        assert_eq!(
            recorder.take(),
            vec![DomainEvent::MessageUpdated {
                conversation_id: chat.group,
                message_id: sent.message.id,
                state: "deleted".to_string(),
            }]
        );
        assert!(entity_api::message::find_by_id(&db, sent.message.id)
            .await
            .is_err());

        Ok(())
    }

    #[tokio::test]
    async fn forward_copies_into_the_target_conversation() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let direct =
            entity_api::conversation::create(&db, "", false, &[chat.bob, chat.carol]).await?;
        let sent = send(&db, &publisher, chat.alice, chat.group, text("news")).await?;
        recorder.take();

        let forwarded = forward(
            &db,
            &publisher,
            chat.bob,
            chat.group,
            sent.message.id,
            direct.id,
        )
        .await?;
        let not_in_target = forward(
            &db,
            &publisher,
            chat.alice,
            chat.group,
            sent.message.id,
            direct.id,
        )
        .await;

        assert!(forwarded.message.is_forwarded);
        assert_eq!(forwarded.message.sender_id, chat.bob);
        assert_eq!(forwarded.message.conversation_id, direct.id);
        assert_eq!(forwarded.message.content, "news");
        assert_eq!(kind(not_in_target.unwrap_err()), EntityErrorKind::Forbidden);

        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].conversation_id(), Some(direct.id));

        Ok(())
    }

    #[tokio::test]
    async fn react_replaces_and_unreact_removes() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let sent = send(&db, &publisher, chat.alice, chat.group, text("party")).await?;
        recorder.take();

        react(&db, &publisher, chat.bob, chat.group, sent.message.id, "🎉").await?;
        react(&db, &publisher, chat.bob, chat.group, sent.message.id, "👍").await?;
        let detail = details(&db, vec![sent.message.clone()]).await?;
        assert_eq!(detail[0].reactions.len(), 1);
        assert_eq!(detail[0].reactions[0].emoji, "👍");

        unreact(&db, &publisher, chat.bob, chat.group, sent.message.id).await?;
        let again = unreact(&db, &publisher, chat.bob, chat.group, sent.message.id).await;
        assert_eq!(kind(again.unwrap_err()), EntityErrorKind::NotFound);

        let emojis: Vec<Option<String>> = recorder
            .take()
            .into_iter()
            .map(|event| match event {
                DomainEvent::MessageReaction { emoji, .. } => emoji,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(
            emojis,
            vec![Some("🎉".to_string()), Some("👍".to_string()), None]
        );

        Ok(())
    }

    #[tokio::test]
    async fn message_becomes_read_once_every_other_member_read_it() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let sent = send(&db, &publisher, chat.alice, chat.group, text("seen?")).await?;
        recorder.take();
        let id = sent.message.id;

        let own = mark_read(&db, &publisher, chat.alice, chat.group, id).await?;
        assert_eq!(own.state, MessageState::Sent);
        assert!(recorder.take().is_empty());

        let after_bob = mark_read(&db, &publisher, chat.bob, chat.group, id).await?;
        assert_eq!(after_bob.state, MessageState::Sent);
        let bob_events = recorder.take();
        assert_eq!(bob_events.len(), 1);
        assert!(matches!(
            &bob_events[0],
            DomainEvent::MessageRead { reader_id, .. } if *reader_id == chat.bob
        ));

        mark_read(&db, &publisher, chat.bob, chat.group, id).await?;
        assert!(recorder.take().is_empty());

        let after_carol = mark_read(&db, &publisher, chat.carol, chat.group, id).await?;
        assert_eq!(after_carol.state, MessageState::Read);
        let carol_events = recorder.take();
        assert_eq!(carol_events.len(), 2);
        assert_eq!(
            carol_events[1],
            DomainEvent::MessageUpdated {
                conversation_id: chat.group,
                message_id: id,
                state: "read".to_string(),
            }
        );

        let detail = details(&db, vec![after_carol]).await?;
        assert_eq!(detail[0].read_by.len(), 2);

        Ok(())
    }

    /// Drops a table once the first event of any kind is published, so the
    /// queries that follow the committed write fail.
    struct DropTableOnPublish {
        db: DatabaseConnection,
        table: &'static str,
    }

    #[async_trait::async_trait]
    impl events::EventHandler for DropTableOnPublish {
        async fn handle(&self, _event: &DomainEvent) {
            use sea_orm::ConnectionTrait;
            let _ = self
                .db
                .execute_unprepared(&format!("DROP TABLE IF EXISTS {}", self.table))
                .await;
        }
    }

    #[tokio::test]
    async fn a_committed_receipt_is_kept_when_the_state_check_fails() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, _recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;
        let sent = send(&db, &publisher, chat.alice, chat.group, text("seen?")).await?;
        let id = sent.message.id;

        let breaking = EventPublisher::new().with_handler(std::sync::Arc::new(
            DropTableOnPublish {
                db: db.clone(),
                table: "conversation_members",
            },
        ));

        let after_bob = mark_read(&db, &breaking, chat.bob, chat.group, id).await?;
        assert_eq!(after_bob.id, id);
        assert_eq!(after_bob.state, MessageState::Sent);
        assert_eq!(message_read::reader_ids(&db, id).await?, vec![chat.bob]);

        Ok(())
    }

    #[tokio::test]
    async fn a_sent_message_is_returned_and_published_when_its_detail_cannot_load(
    ) -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, recorder) = Recorder::publisher();
        let chat = group_chat(&db).await;

        {
            use sea_orm::ConnectionTrait;
            db.execute_unprepared("DROP TABLE reactions").await.unwrap();
        }

        let sent = send(&db, &publisher, chat.alice, chat.group, text("still here")).await?;
        assert_eq!(sent.message.content, "still here");
        assert!(sent.reactions.is_empty());
        assert_eq!(message::find_by_id(&db, sent.message.id).await?.id, sent.message.id);

        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DomainEvent::MessageCreated { conversation_id, .. } if *conversation_id == chat.group
        ));

        Ok(())
    }
}
