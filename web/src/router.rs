use crate::{controller::health_check_controller, params, protect, ws, AppState};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::controller::{
    comment_controller, contact_controller, conversation_controller, message_controller,
    user_controller, user_session_controller,
};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "WASAText API"
        ),
        paths(
            health_check_controller::liveness,
            user_session_controller::login,
            user_controller::index,
            user_controller::update_name,
            user_controller::update_photo,
            contact_controller::index,
            contact_controller::create,
            contact_controller::delete,
            conversation_controller::index,
            conversation_controller::create,
            conversation_controller::read,
            conversation_controller::update_name,
            conversation_controller::update_photo,
            conversation_controller::add_member,
            conversation_controller::leave,
            message_controller::create,
            message_controller::delete,
            message_controller::forward,
            message_controller::react,
            message_controller::unreact,
            message_controller::read,
            comment_controller::create,
            comment_controller::delete,
        ),
        components(
            schemas(
                domain::users::Model,
                domain::conversations::Model,
                domain::messages::Model,
                domain::reactions::Model,
                domain::comments::Model,
                domain::MessageFormat,
                domain::MessageState,
                domain::jwt::Jwt,
                domain::conversation::ConversationSummary,
                domain::conversation::ConversationDetail,
                domain::conversation::CreateParams,
                domain::message::MessageDetail,
                domain::message::MessageParams,
                domain::message::ReplyPreview,
                params::user::LoginParams,
                params::user::UpdateNameParams,
                params::user::UpdatePhotoParams,
                params::contact::AddParams,
                params::conversation::UpdateNameParams,
                params::conversation::UpdatePhotoParams,
                params::conversation::AddMemberParams,
                params::message::ForwardParams,
                params::message::ReactionParams,
                params::comment::CreateParams,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "wasatext", description = "WASAText messaging API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Every endpoint except login and liveness expects the token returned by
// `POST /session` in an `Authorization: Bearer` header.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(conversation_routes(app_state.clone()))
        .merge(conversation_member_routes(app_state.clone()))
        .merge(ws_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/liveness", get(health_check_controller::liveness))
        .with_state(app_state)
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/session", post(user_session_controller::login))
        .with_state(app_state)
}

// Authentication for these is enforced by the `AuthenticatedUser` extractor.
fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/users", get(user_controller::index))
        .route("/users/me/name", put(user_controller::update_name))
        .route("/users/me/photo", put(user_controller::update_photo))
        .route(
            "/users/me/contacts",
            get(contact_controller::index).post(contact_controller::create),
        )
        .route(
            "/users/me/contacts/{contact_id}",
            delete(contact_controller::delete),
        )
        .with_state(app_state)
}

fn conversation_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/conversations", get(conversation_controller::index))
        .route("/conversations", post(conversation_controller::create))
        .with_state(app_state)
}

// Everything under /conversations/{conversation_id} requires membership of
// that conversation. Forward additionally checks the target conversation.
fn conversation_member_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/conversations/{conversation_id}",
            get(conversation_controller::read),
        )
        .route(
            "/conversations/{conversation_id}/name",
            put(conversation_controller::update_name),
        )
        .route(
            "/conversations/{conversation_id}/photo",
            put(conversation_controller::update_photo),
        )
        .route(
            "/conversations/{conversation_id}/members",
            post(conversation_controller::add_member),
        )
        .route(
            "/conversations/{conversation_id}/members/me",
            delete(conversation_controller::leave),
        )
        .route(
            "/conversations/{conversation_id}/messages",
            post(message_controller::create),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}",
            delete(message_controller::delete),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}/forward",
            post(message_controller::forward),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}/reaction",
            put(message_controller::react).delete(message_controller::unreact),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}/read",
            post(message_controller::read),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}/comments",
            post(comment_controller::create),
        )
        .route(
            "/conversations/{conversation_id}/messages/{message_id}/comments/{comment_id}",
            delete(comment_controller::delete),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            protect::conversations::member,
        ))
        .with_state(app_state)
}

fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::upgrade))
        .with_state(app_state)
}
