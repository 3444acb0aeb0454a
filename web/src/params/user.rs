use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /session`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct LoginParams {
    /// 3 to 16 characters. Unknown names are registered on the spot.
    pub(crate) name: String,
}

/// Query of `GET /users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct IndexParams {
    /// Only users whose name contains this text
    pub(crate) name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateNameParams {
    pub(crate) new_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePhotoParams {
    /// URL or data URL of the picture; `null` or blank clears it
    pub(crate) new_pic: Option<String>,
}
