use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = CommentParams)]
pub(crate) struct CreateParams {
    pub(crate) comment_text: String,
}
