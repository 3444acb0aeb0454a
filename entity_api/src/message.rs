use super::error::Error;
use chrono::Utc;
use entity::message_format::MessageFormat;
use entity::message_state::MessageState;
use entity::messages::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

/// Everything needed to insert a message; ids and timestamps are assigned on
/// insert and the state always starts as `sent`.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Id,
    pub sender_id: Id,
    pub content: String,
    pub format: MessageFormat,
    pub reply_to: Option<Id>,
    pub is_forwarded: bool,
}

pub async fn create(db: &impl ConnectionTrait, new_message: NewMessage) -> Result<Model, Error> {
    debug!("New message to be inserted: {new_message:?}");

    let message_active_model = ActiveModel {
        conversation_id: Set(new_message.conversation_id),
        sender_id: Set(new_message.sender_id),
        content: Set(new_message.content),
        format: Set(new_message.format),
        state: Set(MessageState::Sent),
        reply_to: Set(new_message.reply_to),
        is_forwarded: Set(new_message.is_forwarded),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    Ok(message_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Finds a message only if it belongs to `conversation_id`.
pub async fn find_in_conversation(
    db: &impl ConnectionTrait,
    conversation_id: Id,
    id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::ConversationId.eq(conversation_id))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_ids(db: &impl ConnectionTrait, ids: &[Id]) -> Result<Vec<Model>, Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Entity::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?)
}

/// Messages of a conversation, oldest first.
pub async fn find_by_conversation(
    db: &impl ConnectionTrait,
    conversation_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ConversationId.eq(conversation_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

pub async fn find_latest_in_conversation(
    db: &impl ConnectionTrait,
    conversation_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::ConversationId.eq(conversation_id))
        .order_by_desc(Column::Id)
        .one(db)
        .await?)
}

pub async fn update_state(
    db: &impl ConnectionTrait,
    id: Id,
    state: MessageState,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = find_by_id(db, id).await?.into();
    active_model.state = Set(state);

    Ok(active_model.update(db).await?)
}

/// Deletes a message with its receipts, reactions and comments. Replies to
/// it keep existing with `reply_to` cleared.
pub async fn delete(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}
