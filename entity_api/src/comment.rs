use super::error::Error;
use chrono::Utc;
use entity::comments::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    message_id: Id,
    user_id: Id,
    comment_text: &str,
) -> Result<Model, Error> {
    debug!("New comment by user {user_id} on message {message_id}");

    Ok(ActiveModel {
        message_id: Set(message_id),
        user_id: Set(user_id),
        comment_text: Set(comment_text.to_owned()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Comments on any of `message_ids`, oldest first.
pub async fn find_by_messages(
    db: &impl ConnectionTrait,
    message_ids: &[Id],
) -> Result<Vec<Model>, Error> {
    if message_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Entity::find()
        .filter(Column::MessageId.is_in(message_ids.iter().copied()))
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

pub async fn delete(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}
