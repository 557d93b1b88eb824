//! Handler functions for the database backup API.
//!
//! Failures are reported with status 400 and the reason is kept in the logs.

use std::collections::HashMap;

use axum::extract::{Query, State};

use crate::database::LogType;
use crate::responses::BasicResponse;
use crate::services::audit;
use crate::state::SharedState;

pub async fn make_backup(State(state): State<SharedState>) -> BasicResponse {
    let store = state.store.as_ref();
    match state.backup.dump().await {
        Ok(path) => {
            let message = format!("Backup created successfully: {}", path.display());
            audit::record(store, LogType::Info, message).await;
            BasicResponse::ok("Backup created successfully")
        }
        Err(e) => {
            audit::record(store, LogType::Error, format!("Backup not created: {e}")).await;
            BasicResponse::failure(400, "Backup not created")
        }
    }
}

pub async fn restore_backup(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> BasicResponse {
    let store = state.store.as_ref();
    let date = params.get("date").map(String::as_str).unwrap_or_default();
    match state.backup.restore(date).await {
        Ok(()) => {
            let message = format!("Backup restored successfully: {date}");
            audit::record(store, LogType::Info, message).await;
            BasicResponse::ok("Backup restored successfully")
        }
        Err(e) => {
            audit::record(store, LogType::Error, format!("Backup not restored: {e}")).await;
            BasicResponse::failure(400, "Backup not restored")
        }
    }
}
