use crate::connection::UserId;
use crate::error::Error;
use crate::message::ConversationId;
use async_trait::async_trait;

/// Read-only view of conversation membership, queried at fan-out time.
///
/// Implementations should return [`Error::not_found`] when the conversation
/// or user does not exist anymore, so the router can tell a vanished target
/// apart from a failing backend.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn conversation_members(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<UserId>, Error>;

    async fn user_conversations(&self, user_id: UserId) -> Result<Vec<ConversationId>, Error>;
}
