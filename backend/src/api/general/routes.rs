//! Defines the HTTP routes for the general endpoints.

use axum::{routing::get, Router};

use super::handlers::{favicon, index, poll};
use crate::state::SharedState;

pub fn general_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/favicon.ico", get(favicon))
        .route("/poll", get(poll))
}
