use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
};
use domain::{error::Error as DomainError, jwt, user as UserApi, users, Id};
use log::*;

pub(crate) struct AuthenticatedUser(pub users::Model);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    // Resolves the caller from the `Authorization: Bearer` header. A missing,
    // invalid or expired token, or one issued to a user that no longer
    // exists, is rejected with 401. A failed user lookup is a 500.
    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            trace!("Request to {} without a bearer token", parts.uri.path());
            unauthorized()
        })?;

        authenticate(app_state, token).await.map(AuthenticatedUser)
    }
}

/// The token of an `Authorization: Bearer <token>` header, if present.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies `token` and loads the user it was issued to.
pub(crate) async fn authenticate(
    app_state: &AppState,
    token: &str,
) -> Result<users::Model, RejectionType> {
    let user_id = jwt::authenticate_token(app_state.config(), token).map_err(|e| {
        trace!("Rejected bearer token: {e:?}");
        unauthorized()
    })?;

    UserApi::find_by_id(app_state.db_conn_ref(), user_id)
        .await
        .map_err(|e| lookup_rejection(user_id, e.into()))
}

/// A token for a user that is gone is 401; failing to look the user up is 500.
fn lookup_rejection(user_id: Id, err: DomainError) -> RejectionType {
    if err.is_not_found() {
        warn!("Valid token for user {user_id} who no longer exists");
        unauthorized()
    } else {
        error!("Could not load user {user_id} for a valid token: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL SERVER ERROR".to_string(),
        )
    }
}

pub(crate) fn unauthorized() -> RejectionType {
    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED".to_string())
}
