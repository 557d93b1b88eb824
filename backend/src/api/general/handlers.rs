//! Handler functions for the general endpoints.

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Uri},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::errors::AppError;
use crate::responses::BasicResponse;
use crate::state::SharedState;

pub async fn index() -> &'static str {
    "Welcome to the VISIA-BackEnd v2.0!"
}

pub async fn favicon(State(state): State<SharedState>) -> Result<Response, AppError> {
    let path = state.config.static_dir.join("favicon.ico");
    match tokio::fs::read(&path).await {
        Ok(icon) => Ok(([(CONTENT_TYPE, "image/vnd.microsoft.icon")], icon).into_response()),
        Err(e) => {
            warn!("favicon not served from {}: {e}", path.display());
            Err(AppError::NotFound(
                "Resource not found: /favicon.ico".to_string(),
            ))
        }
    }
}

/// Reports whether MongoDB answers a ping.
pub async fn poll(State(state): State<SharedState>) -> BasicResponse {
    match state.store.ping().await {
        Ok(()) => BasicResponse::ok("Flask and MongoDB are UP!"),
        Err(e) => {
            warn!("MongoDB ping failed: {e}");
            BasicResponse::failure(503, "Flask is UP! but MongoDB is DOWN!")
        }
    }
}

pub async fn not_found(uri: Uri) -> BasicResponse {
    warn!("404 - {uri}");
    BasicResponse::failure(404, format!("Resource not found: {uri}"))
}
