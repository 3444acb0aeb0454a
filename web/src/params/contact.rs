use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /users/me/contacts`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddParams {
    pub(crate) contact_id: Id,
}
