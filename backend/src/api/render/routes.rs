//! Defines the HTTP routes for the record-session rendering API.

use axum::{routing::get, Router};

use super::handlers::{get_record_data, render_video};
use crate::state::SharedState;

pub fn render_router() -> Router<SharedState> {
    Router::new()
        .route("/render/getRecordData", get(get_record_data))
        .route("/video", get(render_video))
}
