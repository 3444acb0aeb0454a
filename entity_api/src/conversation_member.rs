use super::error::Error;
use chrono::Utc;
use entity::conversation_members::{ActiveModel, Column, Entity};
use entity::{users, Id};
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, QuerySelect, Set};

/// Adds `user_id` to the conversation. Adding an existing member is a no-op;
/// the return value tells whether a row was inserted.
pub async fn add(
    db: &impl ConnectionTrait,
    conversation_id: Id,
    user_id: Id,
) -> Result<bool, Error> {
    let membership = ActiveModel {
        conversation_id: Set(conversation_id),
        user_id: Set(user_id),
        joined_at: Set(Utc::now().into()),
    };

    let inserted = Entity::insert(membership)
        .on_conflict(
            OnConflict::columns([Column::ConversationId, Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

pub async fn remove(db: &impl ConnectionTrait, conversation_id: Id, user_id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id((conversation_id, user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}

pub async fn is_member(
    db: &impl ConnectionTrait,
    conversation_id: Id,
    user_id: Id,
) -> Result<bool, Error> {
    Ok(Entity::find_by_id((conversation_id, user_id))
        .one(db)
        .await?
        .is_some())
}

/// Ids of the current members, ascending.
pub async fn member_ids(db: &impl ConnectionTrait, conversation_id: Id) -> Result<Vec<Id>, Error> {
    Ok(Entity::find()
        .select_only()
        .column(Column::UserId)
        .filter(Column::ConversationId.eq(conversation_id))
        .order_by_asc(Column::UserId)
        .into_tuple()
        .all(db)
        .await?)
}

pub async fn members(
    db: &impl ConnectionTrait,
    conversation_id: Id,
) -> Result<Vec<users::Model>, Error> {
    let ids = member_ids(db, conversation_id).await?;
    super::user::find_by_ids(db, &ids).await
}

/// Ids of the conversations `user_id` currently belongs to, ascending.
pub async fn conversation_ids(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Id>, Error> {
    Ok(Entity::find()
        .select_only()
        .column(Column::ConversationId)
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::ConversationId)
        .into_tuple()
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use crate::test_support::setup_db;
    use crate::{conversation, user};

    #[tokio::test]
    async fn membership_is_tracked_in_both_directions() -> Result<(), Error> {
        let db = setup_db().await;
        let alice = user::create(&db, "alice").await?;
        let bob = user::create(&db, "bob").await?;
        let group = conversation::create(&db, "crew", true, &[alice.id]).await?;

        assert!(add(&db, group.id, bob.id).await?);
        assert!(!add(&db, group.id, bob.id).await?);

        assert_eq!(member_ids(&db, group.id).await?, vec![alice.id, bob.id]);
        assert_eq!(conversation_ids(&db, bob.id).await?, vec![group.id]);
        assert!(is_member(&db, group.id, bob.id).await?);

        let names: Vec<String> = members(&db, group.id)
            .await?
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "bob"]);

        Ok(())
    }

    #[tokio::test]
    async fn removing_a_non_member_is_not_found() -> Result<(), Error> {
        let db = setup_db().await;
        let alice = user::create(&db, "alice").await?;
        let group = conversation::create(&db, "crew", true, &[alice.id]).await?;

        remove(&db, group.id, alice.id).await?;
        assert!(!is_member(&db, group.id, alice.id).await?);

        let err = remove(&db, group.id, alice.id).await.unwrap_err();
        assert_eq!(err.error_kind, EntityApiErrorKind::RecordNotFound);

        Ok(())
    }
}
