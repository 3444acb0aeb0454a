use crate::error::Error;
use crate::jwt::{self, Jwt};
use crate::{users, Id};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use service::config::Config;

pub use entity_api::user::find_by_id;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 16;

/// Trims `username` and checks it is between 3 and 16 characters long.
pub fn validate_username(username: &str) -> Result<&str, Error> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        debug!("Rejected username of {len} characters");
        return Err(Error::invalid());
    }
    Ok(username)
}

/// Logs `username` in, creating the user on first use. The flag is true when
/// the user was created by this call.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    username: &str,
) -> Result<(Jwt, bool), Error> {
    let username = validate_username(username)?;
    let (user, created) = entity_api::user::find_or_create(db, username).await?;

    if created {
        info!("Registered new user {} ({username})", user.id);
    }

    Ok((jwt::generate_token(config, user)?, created))
}

/// Lists users, optionally only those whose name contains `name_filter`.
pub async fn find_all(
    db: &DatabaseConnection,
    name_filter: Option<&str>,
) -> Result<Vec<users::Model>, Error> {
    let name_filter = name_filter.map(str::trim).filter(|f| !f.is_empty());
    Ok(entity_api::user::find_all(db, name_filter).await?)
}

pub async fn set_name(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    new_name: &str,
) -> Result<users::Model, Error> {
    let new_name = validate_username(new_name)?;
    let current = find_by_id(db, user_id).await?;
    if current.username == new_name {
        return Ok(current);
    }

    // A taken name surfaces as a unique constraint violation, i.e. Invalid.
    let user = entity_api::user::update_username(db, user_id, new_name).await?;
    publish_profile(event_publisher, &user).await;

    Ok(user)
}

/// Sets or clears (`None` or blank) the user's profile picture.
pub async fn set_photo(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    user_id: Id,
    picture: Option<String>,
) -> Result<users::Model, Error> {
    let picture = picture.filter(|p| !p.trim().is_empty());
    let user = entity_api::user::update_profile_picture(db, user_id, picture).await?;
    publish_profile(event_publisher, &user).await;

    Ok(user)
}

async fn publish_profile(event_publisher: &EventPublisher, user: &users::Model) {
    event_publisher
        .publish(DomainEvent::ProfileUpdated {
            user_id: user.id,
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        })
        .await;
}
