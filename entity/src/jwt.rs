use crate::users;
use serde::Serialize;
use utoipa::ToSchema;

/// A signed bearer token together with the user it was issued to.
/// Note: This struct does not have a corresponding entity in the database.
#[derive(Serialize, Debug, ToSchema)]
#[schema(as = jwt::Jwt)] // OpenAPI schema
pub struct Jwt {
    pub token: String,
    pub user: users::Model,
}
