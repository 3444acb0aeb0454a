use async_trait::async_trait;
use domain::{conversation as ConversationApi, error::Error as DomainError};
use realtime::{message::ConversationId, Error, MembershipDirectory, UserId};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Membership as currently stored, read at the moment an event is routed.
pub struct DatabaseDirectory {
    db: Arc<DatabaseConnection>,
}

impl DatabaseDirectory {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipDirectory for DatabaseDirectory {
    async fn conversation_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<UserId>, Error> {
        ConversationApi::member_ids(&self.db, conversation_id)
            .await
            .map_err(resolution_error)
    }

    async fn user_conversations(&self, user_id: UserId) -> Result<Vec<ConversationId>, Error> {
        ConversationApi::ids_for_member(&self.db, user_id)
            .await
            .map_err(resolution_error)
    }
}

fn resolution_error(err: DomainError) -> Error {
    if err.is_not_found() {
        Error::not_found()
    } else {
        Error::resolution(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{conversation::CreateParams, user as UserApi};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};
    use service::config::Config;

    async fn setup_db() -> Arc<DatabaseConnection> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(db)
    }

    #[tokio::test]
    async fn resolves_members_and_conversations_from_the_database() {
        let db = setup_db().await;
        let config = Config::from_args(["wasatext"]).unwrap();
        let (alice, _) = UserApi::login(&db, &config, "alice").await.unwrap();
        let (bob, _) = UserApi::login(&db, &config, "bob").await.unwrap();

        let (summary, _) = ConversationApi::create(
            &db,
            alice.user.id,
            CreateParams {
                name: None,
                member_ids: vec![bob.user.id],
            },
        )
        .await
        .unwrap();
        let conversation_id = summary.conversation.id;

        let directory = DatabaseDirectory::new(db);

        let mut members = directory.conversation_members(conversation_id).await.unwrap();
        members.sort();
        assert_eq!(members, vec![alice.user.id, bob.user.id]);
        assert_eq!(
            directory.user_conversations(bob.user.id).await.unwrap(),
            vec![conversation_id]
        );
    }

    #[tokio::test]
    async fn a_missing_conversation_is_reported_as_not_found() {
        let directory = DatabaseDirectory::new(setup_db().await);

        let err = directory.conversation_members(404).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
