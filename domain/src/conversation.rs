use crate::error::Error;
use crate::message::{self, MessageDetail};
use crate::{conversations, messages, users, Id};
use entity_api::{conversation, conversation_member};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use entity_api::conversation::find_by_id;

const MAX_GROUP_NAME_LEN: usize = 64;

/// Request to start a conversation. With exactly one other member it is a
/// direct chat and `name` is ignored; with more it is a group and `name` is
/// required.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParams {
    pub name: Option<String>,
    pub member_ids: Vec<Id>,
}

/// One row of the caller's conversation list.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation: conversations::Model,
    pub members: Vec<users::Model>,
    pub last_message: Option<messages::Model>,
}

/// A conversation with its full history.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetail {
    pub conversation: conversations::Model,
    pub members: Vec<users::Model>,
    pub messages: Vec<MessageDetail>,
}

/// Loads a conversation on behalf of `user_id`: NotFound when it does not
/// exist, Forbidden when the user is not a current member.
pub async fn require_member(
    db: &DatabaseConnection,
    conversation_id: Id,
    user_id: Id,
) -> Result<conversations::Model, Error> {
    let conversation = find_by_id(db, conversation_id).await?;

    if !conversation_member::is_member(db, conversation_id, user_id).await? {
        debug!("User {user_id} is not a member of conversation {conversation_id}");
        return Err(Error::forbidden());
    }

    Ok(conversation)
}

/// Ids of the current members. NotFound once the conversation is gone.
pub async fn member_ids(db: &DatabaseConnection, conversation_id: Id) -> Result<Vec<Id>, Error> {
    find_by_id(db, conversation_id).await?;
    Ok(conversation_member::member_ids(db, conversation_id).await?)
}

/// Ids of every conversation `user_id` currently belongs to.
pub async fn ids_for_member(db: &DatabaseConnection, user_id: Id) -> Result<Vec<Id>, Error> {
    Ok(conversation_member::conversation_ids(db, user_id).await?)
}

/// Starts a conversation between `creator_id` and `params.member_ids`. A direct
/// chat that already exists between the same two users is returned instead of
/// creating a second one; the flag is true only when something was created.
pub async fn create(
    db: &DatabaseConnection,
    creator_id: Id,
    params: CreateParams,
) -> Result<(ConversationSummary, bool), Error> {
    let mut others = params.member_ids;
    others.retain(|id| *id != creator_id);
    others.sort_unstable();
    others.dedup();

    if others.is_empty() {
        debug!("User {creator_id} tried to start a conversation with nobody");
        return Err(Error::invalid());
    }

    let found = entity_api::user::find_by_ids(db, &others).await?;
    if found.len() != others.len() {
        debug!("Conversation members {others:?} include unknown users");
        return Err(Error::invalid());
    }

    let (created, is_new) = match others.as_slice() {
        [other] => match conversation::find_direct_between(db, creator_id, *other).await? {
            Some(existing) => (existing, false),
            None => (
                conversation::create(db, "", false, &[creator_id, *other]).await?,
                true,
            ),
        },
        _ => {
            let name = validate_group_name(params.name.as_deref().unwrap_or_default())?;
            let mut member_ids = others.clone();
            member_ids.push(creator_id);
            (conversation::create(db, name, true, &member_ids).await?, true)
        }
    };

    if is_new {
        info!(
            "User {creator_id} started conversation {} with {others:?}",
            created.id
        );
    }

    Ok((summarize(db, created).await?, is_new))
}

/// The caller's conversations, most recently active first.
pub async fn find_all_for_user(
    db: &DatabaseConnection,
    user_id: Id,
) -> Result<Vec<ConversationSummary>, Error> {
    let mut summaries = Vec::new();
    for found in conversation::find_by_member(db, user_id).await? {
        summaries.push(summarize(db, found).await?);
    }

    summaries.sort_by(|a, b| last_activity(b).cmp(&last_activity(a)));
    Ok(summaries)
}

pub async fn find_for_member(
    db: &DatabaseConnection,
    user_id: Id,
    conversation_id: Id,
) -> Result<ConversationDetail, Error> {
    let conversation = require_member(db, conversation_id, user_id).await?;
    let members = conversation_member::members(db, conversation_id).await?;
    let history = entity_api::message::find_by_conversation(db, conversation_id).await?;

    Ok(ConversationDetail {
        conversation,
        members,
        messages: message::details(db, history).await?,
    })
}

pub async fn set_name(
    db: &DatabaseConnection,
    user_id: Id,
    conversation_id: Id,
    name: &str,
) -> Result<conversations::Model, Error> {
    require_group(db, conversation_id, user_id).await?;
    let name = validate_group_name(name)?;

    Ok(conversation::update_name(db, conversation_id, name).await?)
}

/// Sets or clears (`None` or blank) a group's picture.
pub async fn set_photo(
    db: &DatabaseConnection,
    user_id: Id,
    conversation_id: Id,
    picture: Option<String>,
) -> Result<conversations::Model, Error> {
    require_group(db, conversation_id, user_id).await?;
    let picture = picture.filter(|p| !p.trim().is_empty());

    Ok(conversation::update_picture(db, conversation_id, picture).await?)
}

/// Adds `new_member_id` to a group and returns the resulting member list.
/// Adding someone who is already a member changes nothing.
pub async fn add_member(
    db: &DatabaseConnection,
    user_id: Id,
    conversation_id: Id,
    new_member_id: Id,
) -> Result<Vec<users::Model>, Error> {
    require_group(db, conversation_id, user_id).await?;

    entity_api::user::find_by_id(db, new_member_id)
        .await
        .map_err(|_| {
            debug!("Cannot add unknown user {new_member_id} to conversation {conversation_id}");
            Error::invalid()
        })?;

    if conversation_member::add(db, conversation_id, new_member_id).await? {
        info!("User {user_id} added {new_member_id} to conversation {conversation_id}");
    }

    Ok(conversation_member::members(db, conversation_id).await?)
}

/// Removes the caller from a group. The group is deleted with its last
/// member.
pub async fn leave(db: &DatabaseConnection, user_id: Id, conversation_id: Id) -> Result<(), Error> {
    require_group(db, conversation_id, user_id).await?;

    conversation_member::remove(db, conversation_id, user_id).await?;

    if conversation_member::member_ids(db, conversation_id)
        .await?
        .is_empty()
    {
        info!("Last member left conversation {conversation_id}, deleting it");
        conversation::delete(db, conversation_id).await?;
    }

    Ok(())
}

async fn require_group(
    db: &DatabaseConnection,
    conversation_id: Id,
    user_id: Id,
) -> Result<conversations::Model, Error> {
    let found = require_member(db, conversation_id, user_id).await?;
    if !found.is_group {
        debug!("Conversation {conversation_id} is a direct chat");
        return Err(Error::invalid());
    }
    Ok(found)
}

fn validate_group_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(Error::invalid());
    }
    Ok(name)
}

async fn summarize(
    db: &DatabaseConnection,
    conversation: conversations::Model,
) -> Result<ConversationSummary, Error> {
    let members = conversation_member::members(db, conversation.id).await?;
    let last_message =
        entity_api::message::find_latest_in_conversation(db, conversation.id).await?;

    Ok(ConversationSummary {
        conversation,
        members,
        last_message,
    })
}

fn last_activity(summary: &ConversationSummary) -> (chrono::DateTime<chrono::FixedOffset>, Id) {
    let at = summary
        .last_message
        .as_ref()
        .map_or(summary.conversation.created_at, |m| m.created_at);
    (at, summary.conversation.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::message::MessageParams;
    use crate::test_support::{setup_db, Recorder};
    use crate::MessageFormat;

    fn kind(err: Error) -> EntityErrorKind {
        match err.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(kind)) => kind,
            other => panic!("expected an entity error, got {other:?}"),
        }
    }

    async fn users(db: &DatabaseConnection, names: &[&str]) -> Vec<Id> {
        let mut ids = Vec::new();
        for name in names {
            ids.push(entity_api::user::create(db, name).await.unwrap().id);
        }
        ids
    }

    fn direct_with(other: Id) -> CreateParams {
        CreateParams {
            name: None,
            member_ids: vec![other],
        }
    }

    fn group_with(name: &str, members: Vec<Id>) -> CreateParams {
        CreateParams {
            name: Some(name.to_string()),
            member_ids: members,
        }
    }

    #[tokio::test]
    async fn direct_chat_is_reused_from_either_side() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob"]).await;

        let (first, created) = create(&db, ids[0], direct_with(ids[1])).await?;
        let (second, created_again) = create(&db, ids[1], direct_with(ids[0])).await?;

        assert!(created);
        assert!(!created_again);
        assert_eq!(first.conversation.id, second.conversation.id);
        assert!(!first.conversation.is_group);
        assert_eq!(first.members.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn groups_need_a_name_and_known_members() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob", "carol"]).await;

        let unnamed = create(&db, ids[0], group_with("  ", vec![ids[1], ids[2]])).await;
        let unknown = create(&db, ids[0], group_with("club", vec![ids[1], 999])).await;
        let alone = create(&db, ids[0], group_with("me", vec![ids[0]])).await;
        let (group, _) = create(&db, ids[0], group_with(" club ", vec![ids[1], ids[2]])).await?;

        assert_eq!(kind(unnamed.unwrap_err()), EntityErrorKind::Invalid);
        assert_eq!(kind(unknown.unwrap_err()), EntityErrorKind::Invalid);
        assert_eq!(kind(alone.unwrap_err()), EntityErrorKind::Invalid);
        assert!(group.conversation.is_group);
        assert_eq!(group.conversation.name, "club");
        assert_eq!(group.members.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn detail_is_for_members_only() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, _recorder) = Recorder::publisher();
        let ids = users(&db, &["alice", "bob", "carol"]).await;
        let (chat, _) = create(&db, ids[0], direct_with(ids[1])).await?;
        let chat_id = chat.conversation.id;
        message::send(
            &db,
            &publisher,
            ids[1],
            chat_id,
            MessageParams {
                content: "hey".to_string(),
                format: MessageFormat::Text,
                reply_to: None,
            },
        )
        .await?;

        let detail = find_for_member(&db, ids[0], chat_id).await?;
        let outsider = find_for_member(&db, ids[2], chat_id).await;
        let missing = find_for_member(&db, ids[0], chat_id + 100).await;

        assert_eq!(detail.messages.len(), 1);
        assert_eq!(detail.messages[0].sender_name, "bob");
        assert_eq!(kind(outsider.unwrap_err()), EntityErrorKind::Forbidden);
        assert_eq!(kind(missing.unwrap_err()), EntityErrorKind::NotFound);

        Ok(())
    }

    #[tokio::test]
    async fn list_is_ordered_by_latest_activity() -> Result<(), Error> {
        let db = setup_db().await;
        let (publisher, _recorder) = Recorder::publisher();
        let ids = users(&db, &["alice", "bob", "carol"]).await;
        let (with_bob, _) = create(&db, ids[0], direct_with(ids[1])).await?;
        let (with_carol, _) = create(&db, ids[0], direct_with(ids[2])).await?;
        message::send(
            &db,
            &publisher,
            ids[1],
            with_bob.conversation.id,
            MessageParams {
                content: "ping".to_string(),
                format: MessageFormat::Text,
                reply_to: None,
            },
        )
        .await?;

        let listed = find_all_for_user(&db, ids[0]).await?;

        assert_eq!(
            listed
                .iter()
                .map(|s| s.conversation.id)
                .collect::<Vec<_>>(),
            vec![with_bob.conversation.id, with_carol.conversation.id]
        );
        assert_eq!(
            listed[0].last_message.as_ref().map(|m| m.content.as_str()),
            Some("ping")
        );
        assert_eq!(listed[1].last_message, None);

        Ok(())
    }

    #[tokio::test]
    async fn group_settings_are_rejected_on_direct_chats() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob"]).await;
        let (chat, _) = create(&db, ids[0], direct_with(ids[1])).await?;
        let chat_id = chat.conversation.id;

        let renamed = set_name(&db, ids[0], chat_id, "ours").await;
        let photo = set_photo(&db, ids[0], chat_id, Some("pic".to_string())).await;
        let left = leave(&db, ids[0], chat_id).await;

        assert_eq!(kind(renamed.unwrap_err()), EntityErrorKind::Invalid);
        assert_eq!(kind(photo.unwrap_err()), EntityErrorKind::Invalid);
        assert_eq!(kind(left.unwrap_err()), EntityErrorKind::Invalid);

        Ok(())
    }

    #[tokio::test]
    async fn members_rename_and_decorate_groups() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob", "carol", "dave"]).await;
        let (group, _) = create(&db, ids[0], group_with("club", vec![ids[1], ids[2]])).await?;
        let group_id = group.conversation.id;

        let renamed = set_name(&db, ids[1], group_id, "book club").await?;
        let pictured = set_photo(&db, ids[2], group_id, Some("cover.png".to_string())).await?;
        let outsider = set_name(&db, ids[3], group_id, "mine").await;

        assert_eq!(renamed.name, "book club");
        assert_eq!(pictured.picture.as_deref(), Some("cover.png"));
        assert_eq!(kind(outsider.unwrap_err()), EntityErrorKind::Forbidden);

        Ok(())
    }

    #[tokio::test]
    async fn add_member_is_idempotent_and_checks_the_user() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob", "carol", "dave"]).await;
        let (group, _) = create(&db, ids[0], group_with("club", vec![ids[1], ids[2]])).await?;
        let group_id = group.conversation.id;

        let members = add_member(&db, ids[0], group_id, ids[3]).await?;
        let again = add_member(&db, ids[1], group_id, ids[3]).await?;
        let unknown = add_member(&db, ids[0], group_id, 999).await;

        assert_eq!(members.len(), 4);
        assert_eq!(again.len(), 4);
        assert_eq!(kind(unknown.unwrap_err()), EntityErrorKind::Invalid);
        assert!(find_for_member(&db, ids[3], group_id).await.is_ok());

        Ok(())
    }

    #[tokio::test]
    async fn group_disappears_with_its_last_member() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob", "carol"]).await;
        let (group, _) = create(&db, ids[0], group_with("club", vec![ids[1], ids[2]])).await?;
        let group_id = group.conversation.id;

        leave(&db, ids[0], group_id).await?;
        assert_eq!(
            kind(find_for_member(&db, ids[0], group_id).await.unwrap_err()),
            EntityErrorKind::Forbidden
        );
        assert_eq!(find_all_for_user(&db, ids[0]).await?.len(), 0);

        leave(&db, ids[1], group_id).await?;
        leave(&db, ids[2], group_id).await?;

        assert!(find_by_id(&db, group_id).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn membership_lookups_follow_joins_and_leaves() -> Result<(), Error> {
        let db = setup_db().await;
        let ids = users(&db, &["alice", "bob", "carol"]).await;
        let (group, _) = create(&db, ids[0], group_with("club", vec![ids[1], ids[2]])).await?;
        let group_id = group.conversation.id;

        leave(&db, ids[2], group_id).await?;

        assert_eq!(member_ids(&db, group_id).await?, vec![ids[0], ids[1]]);
        assert!(ids_for_member(&db, ids[2]).await?.is_empty());
        assert!(member_ids(&db, group_id + 1).await.unwrap_err().is_not_found());

        Ok(())
    }
}
