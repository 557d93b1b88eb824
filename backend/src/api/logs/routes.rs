//! Defines the HTTP routes for the log documents API.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{add_log_backend, add_log_frontend, get_logs_by};
use crate::state::SharedState;

pub fn logs_router() -> Router<SharedState> {
    Router::new()
        .route("/log/addLogFrontEnd", post(add_log_frontend))
        .route("/log/addLogBackEnd", post(add_log_backend))
        .route("/log/getLogsBy", get(get_logs_by))
}
