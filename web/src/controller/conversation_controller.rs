use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{controller::ApiResponse, params::conversation::*};
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::conversation::{ConversationDetail, ConversationSummary, CreateParams};
use domain::{conversation as ConversationApi, conversations, users, Id};

use log::*;

/// GET the authenticated User's Conversations, most recently active first
#[utoipa::path(
    get,
    path = "/conversations",
    responses(
        (status = 200, description = "Successfully retrieved Conversations", body = [ConversationSummary]),
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
    let conversations = ConversationApi::find_all_for_user(app_state.db_conn_ref(), user.id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), conversations)))
}

/// CREATE a Conversation with the given members.
///
/// One other member starts (or returns the existing) direct chat, more make a
/// group, which needs a name. The envelope's `status_code` is 201 when
/// something was created and 200 when an existing direct chat is returned.
#[utoipa::path(
    post,
    path = "/conversations",
    request_body = CreateParams,
    responses(
        (status = 200, description = "Conversation created or found", body = ConversationSummary),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unknown members or a group without a name"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new Conversation from: {params:?}");

    let (summary, created) = ConversationApi::create(app_state.db_conn_ref(), user.id, params).await?;

    let status_code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(Json(ApiResponse::new(status_code.into(), summary)))
}

/// GET a Conversation with its members and full message history
#[utoipa::path(
    get,
    path = "/conversations/{conversation_id}",
    params(
        ("conversation_id" = Id, Path, description = "Conversation id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Conversation", body = ConversationDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Conversation not found"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    let detail =
        ConversationApi::find_for_member(app_state.db_conn_ref(), user.id, conversation_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), detail)))
}

/// UPDATE a group's name
#[utoipa::path(
    put,
    path = "/conversations/{conversation_id}/name",
    params(
        ("conversation_id" = Id, Path, description = "Group to rename")
    ),
    request_body = UpdateNameParams,
    responses(
        (status = 200, description = "Successfully renamed the group", body = conversations::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 422, description = "Not a group, or the name is blank"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_name(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<Id>,
    Json(params): Json<UpdateNameParams>,
) -> Result<impl IntoResponse, Error> {
    let conversation = ConversationApi::set_name(
        app_state.db_conn_ref(),
        user.id,
        conversation_id,
        &params.new_name,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), conversation)))
}

/// UPDATE a group's picture
#[utoipa::path(
    put,
    path = "/conversations/{conversation_id}/photo",
    params(
        ("conversation_id" = Id, Path, description = "Group to update")
    ),
    request_body = UpdatePhotoParams,
    responses(
        (status = 200, description = "Successfully updated the picture", body = conversations::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 422, description = "Not a group"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_photo(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<Id>,
    Json(params): Json<UpdatePhotoParams>,
) -> Result<impl IntoResponse, Error> {
    let conversation = ConversationApi::set_photo(
        app_state.db_conn_ref(),
        user.id,
        conversation_id,
        params.new_pic,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), conversation)))
}

/// CREATE a membership: add a User to a group
#[utoipa::path(
    post,
    path = "/conversations/{conversation_id}/members",
    params(
        ("conversation_id" = Id, Path, description = "Group to add to")
    ),
    request_body = AddMemberParams,
    responses(
        (status = 200, description = "The group's members after the addition", body = [users::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 422, description = "Not a group, or unknown user"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_member(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<Id>,
    Json(params): Json<AddMemberParams>,
) -> Result<impl IntoResponse, Error> {
    let members = ConversationApi::add_member(
        app_state.db_conn_ref(),
        user.id,
        conversation_id,
        params.user_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::CREATED.into(), members)))
}

/// DELETE the authenticated User's own membership of a group
#[utoipa::path(
    delete,
    path = "/conversations/{conversation_id}/members/me",
    params(
        ("conversation_id" = Id, Path, description = "Group to leave")
    ),
    responses(
        (status = 200, description = "Left the group"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a member"),
        (status = 422, description = "Not a group"),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn leave(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    ConversationApi::leave(app_state.db_conn_ref(), user.id, conversation_id).await?;

    info!("User {} left conversation {conversation_id}", user.id);

    Ok(Json(ApiResponse::<()>::no_content(
        StatusCode::NO_CONTENT.into(),
    )))
}
