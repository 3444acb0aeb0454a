//! Comments are threaded notes under a message. They are stored and shown
//! with the message detail but not pushed to connected clients.

use crate::conversation::require_member;
use crate::error::Error;
use crate::{comments, Id};
use entity_api::{comment, message};
use log::*;
use sea_orm::DatabaseConnection;

const MAX_COMMENT_LEN: usize = 1024;

pub async fn add(
    db: &DatabaseConnection,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
    comment_text: &str,
) -> Result<comments::Model, Error> {
    require_member(db, conversation_id, user_id).await?;
    message::find_in_conversation(db, conversation_id, message_id).await?;

    let comment_text = comment_text.trim();
    if comment_text.is_empty() || comment_text.chars().count() > MAX_COMMENT_LEN {
        return Err(Error::invalid());
    }

    Ok(comment::create(db, message_id, user_id, comment_text).await?)
}

/// Deletes a comment. Only its author may do so.
pub async fn delete(
    db: &DatabaseConnection,
    user_id: Id,
    conversation_id: Id,
    message_id: Id,
    comment_id: Id,
) -> Result<(), Error> {
    require_member(db, conversation_id, user_id).await?;
    message::find_in_conversation(db, conversation_id, message_id).await?;

    let existing = comment::find_by_id(db, comment_id).await?;
    if existing.message_id != message_id {
        return Err(Error::not_found());
    }
    if existing.user_id != user_id {
        warn!("User {user_id} tried to delete comment {comment_id} by {}", existing.user_id);
        return Err(Error::forbidden());
    }

    Ok(comment::delete(db, comment_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::MessageFormat;
    use entity_api::message::NewMessage;

    use crate::test_support::setup_db;

    fn kind(err: Error) -> EntityErrorKind {
        match err.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(kind)) => kind,
            other => panic!("expected an entity error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn author_can_remove_their_comment_and_nobody_else_can() -> Result<(), Error> {
        let db = setup_db().await;
        let alice = entity_api::user::create(&db, "alice").await?.id;
        let bob = entity_api::user::create(&db, "bob").await?.id;
        let chat = entity_api::conversation::create(&db, "", false, &[alice, bob]).await?;
        let photo = message::create(
            &db,
            NewMessage {
                conversation_id: chat.id,
                sender_id: alice,
                content: "data:image/png;base64,AAAA".to_string(),
                format: MessageFormat::Image,
                reply_to: None,
                is_forwarded: false,
            },
        )
        .await?;

        let note = add(&db, bob, chat.id, photo.id, "  nice shot ").await?;
        assert_eq!(note.comment_text, "nice shot");

        let blank = add(&db, bob, chat.id, photo.id, " ").await;
        assert_eq!(kind(blank.unwrap_err()), EntityErrorKind::Invalid);

        let by_alice = delete(&db, alice, chat.id, photo.id, note.id).await;
        assert_eq!(kind(by_alice.unwrap_err()), EntityErrorKind::Forbidden);

        delete(&db, bob, chat.id, photo.id, note.id).await?;
        let twice = delete(&db, bob, chat.id, photo.id, note.id).await;
        assert_eq!(kind(twice.unwrap_err()), EntityErrorKind::NotFound);

        Ok(())
    }
}
