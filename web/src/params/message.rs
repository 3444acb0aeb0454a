use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ForwardParams {
    pub(crate) target_conversation_id: Id,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ReactionParams {
    pub(crate) emoji: String,
}
