use crate::{error::Error, extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::IntoResponse,
};
use domain::{conversation as ConversationApi, Id};
use log::*;
use serde::Deserialize;

/// The part of any `/conversations/{conversation_id}/...` path this guard
/// needs. Further path segments are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ConversationPath {
    conversation_id: Id,
}

/// Checks that the conversation referenced by `conversation_id`
///     * exists (404 otherwise)
///     * counts the authenticated user among its current members (403 otherwise)
///  Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn member(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(path): Path<ConversationPath>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    match ConversationApi::require_member(app_state.db_conn_ref(), path.conversation_id, user.id)
        .await
    {
        Ok(_) => next.run(request).await,
        Err(e) => {
            debug!(
                "User {} denied access to conversation {}",
                user.id, path.conversation_id
            );
            Error::from(e).into_response()
        }
    }
}
