//! Handler functions for authentication-related API endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use tracing::{info, warn};

use super::middleware::bearer_token;
use super::models::{AccessToken, Credentials};
use super::service::AddUserOutcome;
use crate::errors::AppError;
use crate::responses::{BasicResponse, DataResponse, TokenResponse};
use crate::state::SharedState;

pub async fn add_user(
    State(state): State<SharedState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<BasicResponse, AppError> {
    let Json(credentials) = payload?;
    let message = match state.auth.add_user(&credentials).await? {
        AddUserOutcome::Added => "User added successfully",
        AddUserOutcome::AlreadyExists => {
            warn!("POST /login/addUser - User already exists");
            "User already exists"
        }
    };
    Ok(BasicResponse::ok(message))
}

pub async fn delete_user(
    State(state): State<SharedState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<BasicResponse, AppError> {
    let Json(credentials) = payload?;
    state.auth.delete_user(&credentials).await?;
    Ok(BasicResponse::ok("User deleted successfully"))
}

pub async fn request_access_token(
    State(state): State<SharedState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<TokenResponse, AppError> {
    let Json(credentials) = payload?;
    let pair = state.auth.login(&credentials).await?;
    info!("POST /requestAccessTokenByUser - Tokens created successfully");
    Ok(TokenResponse {
        base: BasicResponse::ok("Tokens created successfully"),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

pub async fn refresh_access_token(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<DataResponse<AccessToken>, AppError> {
    let access_token = state.auth.refresh(bearer_token(&headers)?)?;
    Ok(DataResponse::new(
        BasicResponse::ok("Access token refreshed successfully"),
        AccessToken { access_token },
    ))
}
