//! HTTP API of Auto Parc.
//!
//! Every route lives under `/api`. `GET /api/health` is public; all other
//! routes need an `Authorization: Bearer <token>` header naming an active
//! user. Responses use the envelope `{"success": bool, "message"?: str, ...}`.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use autoparc_storage::{JsonStorage, SqliteStorage, Storage};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

pub use config::{Config, ConfigError, StorageKind};
pub use error::{ApiError, ServerError};
pub use state::AppState;

use routes::{drivers, missions, vehicles};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/health", get(routes::health))
        .route("/missions", get(missions::list).post(missions::create))
        .route("/missions/stats", get(missions::stats))
        .route("/missions/vehicle/:vehicle_id", get(missions::by_vehicle))
        .route(
            "/missions/:id",
            get(missions::get)
                .put(missions::update)
                .delete(missions::delete),
        )
        .route("/vehicles", get(vehicles::list).post(vehicles::create))
        .route("/vehicles/stats", get(vehicles::stats))
        .route(
            "/vehicles/:id",
            get(vehicles::get)
                .put(vehicles::update)
                .delete(vehicles::delete),
        )
        .route("/drivers", get(drivers::list).post(drivers::create))
        .route("/drivers/active", get(drivers::active))
        .route("/drivers/stats", get(drivers::stats))
        .route("/drivers/:id/license", get(drivers::license))
        .route(
            "/drivers/:id",
            get(drivers::get).put(drivers::update).delete(drivers::delete),
        );

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Open the storage backend `config` selects.
pub async fn open_storage(config: &Config) -> Result<Arc<dyn Storage>, ServerError> {
    let storage: Arc<dyn Storage> = match config.storage {
        StorageKind::Sqlite => {
            info!("Opening SQLite database {}", config.database_url);
            Arc::new(SqliteStorage::new(&config.database_url).await?)
        }
        StorageKind::Json => {
            info!("Opening JSON store in {}", config.data_dir.display());
            Arc::new(JsonStorage::new(&config.data_dir).await?)
        }
    };
    Ok(storage)
}

/// Run the API until Ctrl+C or SIGTERM.
pub async fn serve(config: Config) -> Result<(), ServerError> {
    let storage = open_storage(&config).await?;
    let app = router(AppState::from_config(storage, &config));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Auto Parc API listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
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
}
