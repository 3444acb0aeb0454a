use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use log::*;

/// GET whether the server can still reach its database
#[utoipa::path(
    get,
    path = "/liveness",
    responses(
        (status = 200, description = "API router is up and the database answers", body = String),
        (status = 503, description = "The database is unreachable")
    )
)]
pub async fn liveness(State(app_state): State<AppState>) -> impl IntoResponse {
    match app_state.db_conn_ref().ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Liveness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "SERVICE UNAVAILABLE")
        }
    }
}
