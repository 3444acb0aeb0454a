use super::error::Error;
use chrono::Utc;
use entity::contacts::{ActiveModel, Column, Entity};
use entity::{users, Id};
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, QuerySelect, Set};

/// Records `contact_id` in the address book of `user_id`. Adding an existing
/// contact is a no-op; the return value tells whether a row was inserted.
pub async fn add(db: &impl ConnectionTrait, user_id: Id, contact_id: Id) -> Result<bool, Error> {
    let contact = ActiveModel {
        user_id: Set(user_id),
        contact_id: Set(contact_id),
        created_at: Set(Utc::now().into()),
    };

    let inserted = Entity::insert(contact)
        .on_conflict(
            OnConflict::columns([Column::UserId, Column::ContactId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

pub async fn remove(db: &impl ConnectionTrait, user_id: Id, contact_id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id((user_id, contact_id)).exec(db).await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}

/// The users in the address book of `user_id`, ordered by id.
pub async fn find_by_user(
    db: &impl ConnectionTrait,
    user_id: Id,
) -> Result<Vec<users::Model>, Error> {
    let ids: Vec<Id> = Entity::find()
        .select_only()
        .column(Column::ContactId)
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::ContactId)
        .into_tuple()
        .all(db)
        .await?;

    super::user::find_by_ids(db, &ids).await
}
