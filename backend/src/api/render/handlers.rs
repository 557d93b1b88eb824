//! Handler functions for the record-session rendering API.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::Redirect,
};

use super::RecordSession;
use crate::database::LogType;
use crate::responses::{BasicResponse, DataResponse};
use crate::services::audit;
use crate::state::SharedState;

pub async fn get_record_data(State(state): State<SharedState>) -> DataResponse<RecordSession> {
    let session = state.record_session.read().await.clone();
    DataResponse::new(
        BasicResponse::ok("Data for Record-Session is ready"),
        session,
    )
}

/// Stores the requested session and sends the browser to the frontend.
pub async fn render_video(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    let session = RecordSession {
        crd_id: params
            .get("crd")
            .cloned()
            .unwrap_or_else(|| "UNK".to_string()),
        ov: params.get("ov").and_then(|ov| ov.trim().parse().ok()),
    };

    let ov = session
        .ov
        .map_or_else(|| "UNK".to_string(), |ov| ov.to_string());
    let message = format!("Video requested: {}--{ov}", session.crd_id);
    *state.record_session.write().await = session;
    audit::record(state.store.as_ref(), LogType::Info, message).await;

    Redirect::to(&format!("{}/", state.config.frontend.url()))
}
