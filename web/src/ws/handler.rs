use crate::extractors::authenticated_user::{authenticate, bearer_token, unauthorized};
use crate::AppState;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use log::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct WsParams {
    token: Option<String>,
}

/// GET /ws?token=JWT
///
/// Browsers cannot set headers on a WebSocket handshake, so the token may come
/// from the query string; an `Authorization: Bearer` header works as well.
/// The token is checked before anything else, so an unauthenticated request
/// gets 401 whether or not it asked for an upgrade.
pub(crate) async fn upgrade(
    State(app_state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = params
        .token
        .as_deref()
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(&headers));

    let user = match token {
        Some(token) => authenticate(&app_state, token).await,
        None => Err(unauthorized()),
    };

    let user = match user {
        Ok(user) => user,
        Err(rejection) => {
            debug!("Rejected WebSocket request with {}", rejection.0);
            return rejection.into_response();
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            debug!("User {} sent a non-upgrade request to /ws", user.id);
            return rejection.into_response();
        }
    };

    info!("Opening WebSocket for user {}", user.id);

    let hub = app_state.hub.clone();
    let capacity = app_state.config().outbound_queue_capacity;
    ws.on_upgrade(move |socket| realtime::session::serve(socket, hub, user.id, capacity))
}
