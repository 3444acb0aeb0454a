use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{controller::ApiResponse, params::comment::CreateParams};
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{comment as CommentApi, comments, Id};

/// CREATE a Comment on a Message
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/messages/{message_id}/comments",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message to comment on")
    ),
    request_body = CreateParams,
    responses(
        (status = 200, description = "Successfully added the Comment", body = comments::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Message not found"),
        (status = 422, description = "Blank comment"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Id, Id)>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    let comment = CommentApi::add(
        app_state.db_conn_ref(),
        user.id,
        conversation_id,
        message_id,
        &params.comment_text,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), comment)))
}

/// DELETE a Comment. Only its author may.
#[utoipa::path(
    delete,
    path = "/conversations/{conversation_id}/messages/{message_id}/comments/{comment_id}",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message the comment is on"),
        ("comment_id" = Id, Path, description = "Comment to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the Comment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id, comment_id)): Path<(Id, Id, Id)>,
) -> Result<impl IntoResponse, Error> {
    CommentApi::delete(
        app_state.db_conn_ref(),
        user.id,
        conversation_id,
        message_id,
        comment_id,
    )
    .await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
