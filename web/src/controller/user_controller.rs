use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{controller::ApiResponse, params::user::*};
use crate::{AppState, Error};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{user as UserApi, users};

use log::*;

/// GET all Users, optionally filtered by name
#[utoipa::path(
    get,
    path = "/users",
    params(IndexParams),
    responses(
        (status = 200, description = "Successfully retrieved Users", body = [users::Model]),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    let users = UserApi::find_all(app_state.db_conn_ref(), params.name.as_deref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), users)))
}

/// UPDATE the authenticated User's name
#[utoipa::path(
    put,
    path = "/users/me/name",
    request_body = UpdateNameParams,
    responses(
        (status = 200, description = "Successfully renamed the User", body = users::Model),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Name is malformed or already taken"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_name(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<UpdateNameParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT name of User {} to {:?}", user.id, params.new_name);

    let user = UserApi::set_name(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        &params.new_name,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}

/// UPDATE the authenticated User's profile picture
#[utoipa::path(
    put,
    path = "/users/me/photo",
    request_body = UpdatePhotoParams,
    responses(
        (status = 200, description = "Successfully updated the picture", body = users::Model),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_photo(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<UpdatePhotoParams>,
) -> Result<impl IntoResponse, Error> {
    let user = UserApi::set_photo(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        params.new_pic,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), user)))
}
