use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{controller::ApiResponse, params::message::*};
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::message::{MessageDetail, MessageParams};
use domain::{message as MessageApi, messages, reactions, Id};

use log::*;

/// CREATE a Message in a Conversation
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/messages",
    params(
        ("conversation_id" = Id, Path, description = "Conversation to send to")
    ),
    request_body = MessageParams,
    responses(
        (status = 200, description = "Successfully sent the Message", body = MessageDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 422, description = "Empty content or a reply to a message elsewhere"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<Id>,
    Json(params): Json<MessageParams>,
) -> Result<impl IntoResponse, Error> {
    let detail = MessageApi::send(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        conversation_id,
        params,
    )
    .await?;

    debug!("New Message: {:?}", detail.message);

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), detail)))
}

/// DELETE a Message. Only its sender may.
#[utoipa::path(
    delete,
    path = "/conversations/{conversation_id}/messages/{message_id}",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message to delete")
    ),
    responses(
        (status = 200, description = "Successfully deleted the Message"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the sender"),
        (status = 404, description = "Message not found"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Id, Id)>,
) -> Result<impl IntoResponse, Error> {
    MessageApi::delete(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        conversation_id,
        message_id,
    )
    .await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}

/// CREATE a forwarded copy of a Message in another Conversation
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/messages/{message_id}/forward",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message to forward")
    ),
    request_body = ForwardParams,
    responses(
        (status = 200, description = "Successfully forwarded the Message", body = MessageDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member of both conversations"),
        (status = 404, description = "Message or target not found"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn forward(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Id, Id)>,
    Json(params): Json<ForwardParams>,
) -> Result<impl IntoResponse, Error> {
    let detail = MessageApi::forward(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        conversation_id,
        message_id,
        params.target_conversation_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), detail)))
}

/// UPDATE the authenticated User's reaction on a Message
#[utoipa::path(
    put,
    path = "/conversations/{conversation_id}/messages/{message_id}/reaction",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message to react to")
    ),
    request_body = ReactionParams,
    responses(
        (status = 200, description = "Reaction set", body = reactions::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Message not found"),
        (status = 422, description = "Blank or oversized emoji"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn react(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Id, Id)>,
    Json(params): Json<ReactionParams>,
) -> Result<impl IntoResponse, Error> {
    let reaction = MessageApi::react(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        conversation_id,
        message_id,
        &params.emoji,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), reaction)))
}

/// DELETE the authenticated User's reaction on a Message
#[utoipa::path(
    delete,
    path = "/conversations/{conversation_id}/messages/{message_id}/reaction",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message to clear the reaction from")
    ),
    responses(
        (status = 200, description = "Reaction removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 404, description = "No reaction to remove"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unreact(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Id, Id)>,
) -> Result<impl IntoResponse, Error> {
    MessageApi::unreact(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        conversation_id,
        message_id,
    )
    .await?;

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}

/// CREATE a read receipt for a Message
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/messages/{message_id}/read",
    params(
        ("conversation_id" = Id, Path, description = "Conversation of the message"),
        ("message_id" = Id, Path, description = "Message that was read")
    ),
    responses(
        (status = 200, description = "The message after recording the receipt", body = messages::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Message not found"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((conversation_id, message_id)): Path<(Id, Id)>,
) -> Result<impl IntoResponse, Error> {
    let message = MessageApi::mark_read(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        user.id,
        conversation_id,
        message_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), message)))
}
