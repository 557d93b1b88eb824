//! Visia backend: the HTTP service behind the video-recording frontend.
//!
//! It stores log documents, users and encrypted videos in MongoDB, drives a
//! digiCamControl camera for recordings and makes database backups. Routes
//! are grouped per domain under `api`, with authentication in `auth`.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod responses;
pub mod security;
pub mod services;
pub mod state;
pub mod utils;

use std::{net::SocketAddr, sync::Arc};

use adapters::{CameraAdapter, DigiCam, MediaTools, VideoTools};
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

use api::{
    backup::routes::backup_router, general::handlers::not_found,
    general::routes::general_router, logs::routes::logs_router,
    render::routes::render_router, video::routes::video_router,
};
use auth::auth_router;
use config::Config;
use database::{MongoStore, Store};
use middleware::{cors_layer, request_logging};
use state::{AppState, SharedState};

/// Assembles every route with the shared middleware stack.
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.backend.max_upload_bytes();
    let cors = cors_layer(&state.config.frontend);

    Router::new()
        .merge(general_router())
        .merge(logs_router())
        .merge(auth_router())
        .merge(render_router())
        .merge(video_router())
        .merge(backup_router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(from_fn(request_logging))
        .with_state(state)
}

/// Launches digiCamControl and applies the configured settings. The backend
/// keeps running without a camera.
async fn prepare_camera(camera: &DigiCam) {
    if let Err(e) = camera.launch().await {
        warn!("digiCamControl not available: {e}");
        return;
    }
    if !camera.is_connected().await {
        warn!("Camera: Not connected");
        return;
    }
    match camera.configure(camera.settings()).await {
        Ok(()) => info!("Camera: Configured"),
        Err(e) => warn!("Camera: Configuration failed - {e}"),
    }
}

async fn log_health(state: &SharedState) {
    match state.store.ping().await {
        Ok(()) => info!("MongoDB: Status: UP"),
        Err(e) => warn!("MongoDB: Status: DOWN - {e}"),
    }
    if state.config.frontend.is_up().await {
        info!("Frontend: {} - Status: UP", state.config.frontend.url());
    } else {
        warn!("Frontend: {} - Status: DOWN", state.config.frontend.url());
    }
}

pub async fn start_server() -> anyhow::Result<()> {
    let _guard = logging::init_tracing(&Config::log_dir()?)?;

    info!("Loading configuration...");
    let config = Config::load()?;
    let key = security::load_or_create_key(&config.secret_key_path())?;

    let store: Arc<dyn Store> = Arc::new(MongoStore::connect(&config.mongo).await?);

    let digicam = Arc::new(DigiCam::new(config.camera.clone()));
    prepare_camera(&digicam).await;
    let camera: Arc<dyn CameraAdapter> = digicam;

    let media: Arc<dyn VideoTools> = Arc::new(MediaTools::default());

    let state = AppState::new(config, store, camera.clone(), media, &key).await?;
    log_health(&state).await;

    let address = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    info!("Binding to {address}");
    let listener = TcpListener::bind(address).await?;
    info!("Server running on {address}");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Err(e) = camera.shutdown().await {
        warn!("digiCamControl not stopped: {e}");
    }
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
