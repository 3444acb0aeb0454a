use log::{error, info, warn};
use migration::{Migrator, MigratorTrait};
use realtime::Hub;
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!(
        "Starting WASAText [{}] with database [{}]",
        config.runtime_env(),
        config.database_url()
    );

    if config.uses_default_jwt_secret() {
        if config.is_production() {
            warn!("JWT_SECRET is not set: tokens are signed with the built-in development key");
        } else {
            info!("Using the built-in development JWT secret");
        }
    }

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Migrator::up(db.as_ref(), None).await {
        error!("Failed to apply database migrations: {e}");
        std::process::exit(1);
    }

    let (hub, _control_loop) = Hub::spawn(config.hub_channel_capacity);
    let event_publisher = web::ws::event_publisher(Arc::clone(&db), hub.clone());

    let service_state = service::AppState::new(config, &db);
    let app_state = web::AppState::new(service_state, hub, event_publisher);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
