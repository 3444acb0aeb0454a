use crate::controller::ApiResponse;
use crate::params::user::LoginParams;
use crate::{AppState, Error};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use domain::user as UserApi;
use log::*;

/// Logs a user in by name, registering the name on first use, and returns a
/// bearer token.
///
/// Pass the token back on every other API call, e.g.:
/// curl --header "Authorization: Bearer <token>" http://localhost:3000/conversations
///
/// The envelope's `status_code` is 201 when the user was just created.
#[utoipa::path(
    post,
    path = "/session",
    request_body = LoginParams,
    responses(
        (status = 200, description = "Logged in; returns the bearer token and the user", body = domain::jwt::Jwt),
        (status = 422, description = "Name is not 3 to 16 characters long"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(params): Json<LoginParams>,
) -> Result<impl IntoResponse, Error> {
    let (jwt, created) =
        UserApi::login(app_state.db_conn_ref(), app_state.config(), &params.name).await?;

    debug!("User {} logged in (new: {created})", jwt.user.id);

    let status_code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(Json(ApiResponse::new(status_code.into(), jwt)))
}
