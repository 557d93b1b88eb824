//! Handler functions for the log documents API.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::{LogFilter, LogOrigin, LogRecord, LogType};
use crate::errors::AppError;
use crate::responses::{BasicResponse, DataResponse, ListResponse};
use crate::state::SharedState;

#[derive(Deserialize, Debug)]
pub struct NewLog {
    pub log_type: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct LogId {
    pub id: String,
}

async fn add_log(
    state: &SharedState,
    origin: LogOrigin,
    payload: Result<Json<NewLog>, JsonRejection>,
) -> Result<DataResponse<LogId>, AppError> {
    let Json(new_log) = payload?;
    let log_type: LogType = new_log.log_type.parse().map_err(AppError::BadRequest)?;
    info!("{origin} log: {}", new_log.message);

    let id = state
        .store
        .insert_log(origin, log_type, &new_log.message)
        .await?;
    Ok(DataResponse::new(
        BasicResponse::ok("Log added: successfully"),
        LogId { id: id.to_hex() },
    ))
}

pub async fn add_log_frontend(
    State(state): State<SharedState>,
    payload: Result<Json<NewLog>, JsonRejection>,
) -> Result<DataResponse<LogId>, AppError> {
    add_log(&state, LogOrigin::Frontend, payload).await
}

pub async fn add_log_backend(
    State(state): State<SharedState>,
    payload: Result<Json<NewLog>, JsonRejection>,
) -> Result<DataResponse<LogId>, AppError> {
    add_log(&state, LogOrigin::Backend, payload).await
}

pub async fn get_logs_by(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ListResponse<LogRecord>, AppError> {
    let filter = LogFilter::from_params(&params)?;
    let logs: Vec<LogRecord> = state
        .store
        .find_logs(&filter)
        .await?
        .into_iter()
        .map(LogRecord::from)
        .collect();
    info!("Logs retrieved: {}", logs.len());
    Ok(ListResponse::new(
        BasicResponse::ok("Logs retrieved successfully"),
        logs,
    ))
}
