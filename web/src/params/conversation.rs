use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = GroupUpdateNameParams)]
pub(crate) struct UpdateNameParams {
    pub(crate) new_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = GroupUpdatePhotoParams)]
pub(crate) struct UpdatePhotoParams {
    pub(crate) new_pic: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddMemberParams {
    pub(crate) user_id: Id,
}
