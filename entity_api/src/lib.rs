use entity::message_format::MessageFormat;
use log::info;
use sea_orm::DatabaseConnection;

pub use entity::{
    comments, contacts, conversation_members, conversations, message_reads, messages, reactions,
    users, Id,
};

pub mod comment;
pub mod contact;
pub mod conversation;
pub mod conversation_member;
pub mod error;
pub mod message;
pub mod message_read;
pub mod reaction;
pub mod user;

/// Fills an empty database with a few users, a direct chat and a group so a
/// client has something to show right away.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let alice = user::create(db, "alice").await?;
    let bob = user::create(db, "bob").await?;
    let carol = user::create(db, "carol").await?;

    let direct = conversation::create(db, "", false, &[alice.id, bob.id]).await?;
    let group = conversation::create(db, "Book club", true, &[alice.id, bob.id, carol.id]).await?;

    let greeting = message::create(
        db,
        message::NewMessage {
            conversation_id: direct.id,
            sender_id: alice.id,
            content: "Hi Bob!".to_owned(),
            format: MessageFormat::Text,
            reply_to: None,
            is_forwarded: false,
        },
    )
    .await?;

    message::create(
        db,
        message::NewMessage {
            conversation_id: direct.id,
            sender_id: bob.id,
            content: "Hey Alice, long time no see".to_owned(),
            format: MessageFormat::Text,
            reply_to: Some(greeting.id),
            is_forwarded: false,
        },
    )
    .await?;
    message_read::mark(db, greeting.id, bob.id).await?;

    let pick = message::create(
        db,
        message::NewMessage {
            conversation_id: group.id,
            sender_id: carol.id,
            content: "Next pick: The Left Hand of Darkness".to_owned(),
            format: MessageFormat::Text,
            reply_to: None,
            is_forwarded: false,
        },
    )
    .await?;
    reaction::upsert(db, pick.id, alice.id, "📚").await?;
    comment::create(db, pick.id, bob.id, "Finally!").await?;

    info!("Seeded 3 users and 2 conversations");

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};

    /// A fresh, migrated in-memory database. One pooled connection, since
    /// every SQLite memory connection is its own database.
    pub(crate) async fn setup_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }
}
