use super::error::Error;
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

pub async fn create(db: &impl ConnectionTrait, username: &str) -> Result<Model, Error> {
    debug!("New user to be inserted: {username}");

    let user_active_model = ActiveModel {
        username: Set(username.to_owned()),
        profile_picture: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_username(
    db: &impl ConnectionTrait,
    username: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Returns the user called `username`, creating it on first use. The flag is
/// true when the user was created by this call.
pub async fn find_or_create(
    db: &impl ConnectionTrait,
    username: &str,
) -> Result<(Model, bool), Error> {
    match find_by_username(db, username).await? {
        Some(user) => Ok((user, false)),
        None => Ok((create(db, username).await?, true)),
    }
}

/// All users ordered by username, optionally only those whose name contains
/// `name_filter`.
pub async fn find_all(
    db: &impl ConnectionTrait,
    name_filter: Option<&str>,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find();
    if let Some(filter) = name_filter.filter(|f| !f.is_empty()) {
        query = query.filter(Column::Username.contains(filter));
    }

    Ok(query.order_by_asc(Column::Username).all(db).await?)
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

pub async fn update_username(
    db: &impl ConnectionTrait,
    id: Id,
    username: &str,
) -> Result<Model, Error> {
    let user = find_by_id(db, id).await?;
    debug!("Renaming user {id} from {} to {username}", user.username);

    let mut active_model: ActiveModel = user.into();
    active_model.username = Set(username.to_owned());

    Ok(active_model.update(db).await?)
}

pub async fn update_profile_picture(
    db: &impl ConnectionTrait,
    id: Id,
    profile_picture: Option<String>,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = find_by_id(db, id).await?.into();
    active_model.profile_picture = Set(profile_picture);

    Ok(active_model.update(db).await?)
}
