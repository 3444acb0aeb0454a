use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{controller::ApiResponse, params::contact::AddParams};
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{contact as ContactApi, users, Id};

/// GET the authenticated User's contacts
#[utoipa::path(
    get,
    path = "/users/me/contacts",
    responses(
        (status = 200, description = "Successfully retrieved contacts", body = [users::Model]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let contacts = ContactApi::find_all(app_state.db_conn_ref(), user.id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), contacts)))
}

/// CREATE a contact for the authenticated User
#[utoipa::path(
    post,
    path = "/users/me/contacts",
    request_body = AddParams,
    responses(
        (status = 200, description = "The added contact", body = users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unknown user, or the caller themselves"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<AddParams>,
) -> Result<impl IntoResponse, Error> {
    let contact = ContactApi::add(app_state.db_conn_ref(), user.id, params.contact_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), contact)))
}

/// DELETE a contact of the authenticated User
#[utoipa::path(
    delete,
    path = "/users/me/contacts/{contact_id}",
    params(
        ("contact_id" = Id, Path, description = "User to remove from the contacts")
    ),
    responses(
        (status = 200, description = "Contact removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not a contact"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(contact_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    ContactApi::remove(app_state.db_conn_ref(), user.id, contact_id).await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
