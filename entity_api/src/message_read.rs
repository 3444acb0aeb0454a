use super::error::Error;
use chrono::Utc;
use entity::message_reads::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, QuerySelect, Set};

/// Records that `user_id` read `message_id`. Repeating it keeps the original
/// receipt; the flag is true only when this call created it.
pub async fn mark(
    db: &impl ConnectionTrait,
    message_id: Id,
    user_id: Id,
) -> Result<(Model, bool), Error> {
    let receipt = ActiveModel {
        message_id: Set(message_id),
        user_id: Set(user_id),
        read_at: Set(Utc::now().into()),
    };

    let inserted = Entity::insert(receipt)
        .on_conflict(
            OnConflict::columns([Column::MessageId, Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let receipt = Entity::find_by_id((message_id, user_id))
        .one(db)
        .await?
        .ok_or_else(Error::not_found)?;

    Ok((receipt, inserted > 0))
}

/// Ids of every user holding a receipt for `message_id`, ascending.
pub async fn reader_ids(db: &impl ConnectionTrait, message_id: Id) -> Result<Vec<Id>, Error> {
    Ok(Entity::find()
        .select_only()
        .column(Column::UserId)
        .filter(Column::MessageId.eq(message_id))
        .order_by_asc(Column::UserId)
        .into_tuple()
        .all(db)
        .await?)
}

/// Receipts for any of `message_ids`, oldest first.
pub async fn find_by_messages(
    db: &impl ConnectionTrait,
    message_ids: &[Id],
) -> Result<Vec<Model>, Error> {
    if message_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Entity::find()
        .filter(Column::MessageId.is_in(message_ids.iter().copied()))
        .order_by_asc(Column::ReadAt)
        .all(db)
        .await?)
}
