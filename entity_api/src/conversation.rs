use super::error::Error;
use super::conversation_member;
use chrono::Utc;
use entity::conversations::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set, TransactionTrait};

/// Creates a conversation with the given initial members in one transaction.
pub async fn create(
    db: &impl TransactionTrait,
    name: &str,
    is_group: bool,
    member_ids: &[Id],
) -> Result<Model, Error> {
    debug!("New conversation to be inserted: name={name:?} is_group={is_group} members={member_ids:?}");

    let txn = db.begin().await?;

    let conversation = ActiveModel {
        name: Set(name.to_owned()),
        picture: Set(None),
        is_group: Set(is_group),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for member_id in member_ids {
        conversation_member::add(&txn, conversation.id, *member_id).await?;
    }

    txn.commit().await?;

    Ok(conversation)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
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
        .order_by_asc(Column::Id)
        .all(db)
        .await?)
}

/// Conversations `user_id` currently belongs to.
pub async fn find_by_member(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    let ids = conversation_member::conversation_ids(db, user_id).await?;
    find_by_ids(db, &ids).await
}

/// The direct (non-group) conversation between exactly these two users, if
/// one exists.
pub async fn find_direct_between(
    db: &impl ConnectionTrait,
    user_id: Id,
    other_user_id: Id,
) -> Result<Option<Model>, Error> {
    for conversation in find_by_member(db, user_id).await? {
        if conversation.is_group {
            continue;
        }
        let mut members = conversation_member::member_ids(db, conversation.id).await?;
        members.sort_unstable();
        let mut pair = vec![user_id, other_user_id];
        pair.sort_unstable();
        if members == pair {
            return Ok(Some(conversation));
        }
    }

    Ok(None)
}

pub async fn update_name(db: &impl ConnectionTrait, id: Id, name: &str) -> Result<Model, Error> {
    let mut active_model: ActiveModel = find_by_id(db, id).await?.into();
    active_model.name = Set(name.to_owned());

    Ok(active_model.update(db).await?)
}

pub async fn update_picture(
    db: &impl ConnectionTrait,
    id: Id,
    picture: Option<String>,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = find_by_id(db, id).await?.into();
    active_model.picture = Set(picture);

    Ok(active_model.update(db).await?)
}

/// Deletes the conversation together with its memberships and messages.
pub async fn delete(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let result = Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found());
    }
    Ok(())
}
