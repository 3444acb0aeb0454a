//! HTTP and WebSocket surface of WASAText.
//!
//! Requests are authenticated with the bearer tokens issued by `POST /session`,
//! checked for conversation membership by the `protect` middleware and handed
//! to the `domain` crate. Writes publish domain events that the realtime hub
//! fans out to the sockets opened on `GET /ws`.

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use events::EventPublisher;
use log::*;
use realtime::Hub;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
pub(crate) mod extractors;
mod params;
pub(crate) mod protect;
mod router;
pub mod ws;

pub use error::{Error, Result};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub hub: Hub,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(service_state: service::AppState, hub: Hub, event_publisher: EventPublisher) -> Self {
        Self {
            service_state,
            hub,
            event_publisher: Arc::new(event_publisher),
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

/// The complete application: every route plus the CORS layer.
pub fn app(app_state: AppState) -> Router {
    let cors = cors_layer(app_state.config());
    router::define_routes(app_state).layer(cors)
}

/// Binds the configured address and serves until the process receives
/// Ctrl-C or SIGTERM.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config();
    let interface = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{interface}:{}", config.port);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let listener = TcpListener::bind(&listen_addr).await?;
    serve(listener, app_state, shutdown_signal()).await
}

/// Serves the application on `listener` until `shutdown` resolves, then
/// stops accepting connections and waits for in-flight requests to finish.
pub async fn serve<F>(
    listener: TcpListener,
    app_state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped accepting connections");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining open requests");
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring malformed CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(AllowOrigin::list(origins))
}
