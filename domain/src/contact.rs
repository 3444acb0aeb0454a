//! A user's address book. Contacts are one-directional and private to their
//! owner; nothing about them is pushed to connected clients.

use crate::error::Error;
use crate::{users, Id};
use entity_api::{contact, user};
use log::*;
use sea_orm::DatabaseConnection;

/// Adds `contact_id` to the address book of `user_id` and returns the added
/// user. Adding someone already there succeeds without a second entry.
pub async fn add(
    db: &DatabaseConnection,
    user_id: Id,
    contact_id: Id,
) -> Result<users::Model, Error> {
    if user_id == contact_id {
        return Err(Error::invalid());
    }

    let added = match user::find_by_id(db, contact_id).await {
        Ok(added) => added,
        Err(err) => {
            let err = Error::from(err);
            if err.is_not_found() {
                return Err(Error::invalid());
            }
            return Err(err);
        }
    };

    if contact::add(db, user_id, contact_id).await? {
        debug!("User {user_id} added contact {contact_id}");
    }
    Ok(added)
}

pub async fn find_all(db: &DatabaseConnection, user_id: Id) -> Result<Vec<users::Model>, Error> {
    Ok(contact::find_by_user(db, user_id).await?)
}

pub async fn remove(db: &DatabaseConnection, user_id: Id, contact_id: Id) -> Result<(), Error> {
    Ok(contact::remove(db, user_id, contact_id).await?)
}
