use super::error::Error;
use chrono::Utc;
use entity::reactions::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

/// Sets the user's reaction on a message, replacing a previous one.
pub async fn upsert(
    db: &impl ConnectionTrait,
    message_id: Id,
    user_id: Id,
    emoji: &str,
) -> Result<Model, Error> {
    let existing = Entity::find()
        .filter(Column::MessageId.eq(message_id))
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?;

    match existing {
        Some(reaction) => {
            let mut active_model: ActiveModel = reaction.into();
            active_model.emoji = Set(emoji.to_owned());
            Ok(active_model.update(db).await?)
        }
        None => Ok(ActiveModel {
            message_id: Set(message_id),
            user_id: Set(user_id),
            emoji: Set(emoji.to_owned()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(db)
        .await?),
    }
}

pub async fn remove(db: &impl ConnectionTrait, message_id: Id, user_id: Id) -> Result<(), Error> {
    let result = Entity::delete_many()
        .filter(Column::MessageId.eq(message_id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}

/// Reactions on any of `message_ids`, in the order they were first made.
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
