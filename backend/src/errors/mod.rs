//! Global application error types and handlers.
//!
//! This module defines the error type returned by every handler and the
//! conversion that renders it as a `BasicResponse` JSON body, so failures look
//! the same to the frontend whichever layer produced them.

use adapters::AdapterError;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::database::StoreError;
use crate::responses::BasicResponse;
use crate::security::CryptoError;
use crate::services::uploads::UploadError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Camera(#[from] AdapterError),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Auth(e) => e.status_code(),
            AppError::Store(e) => e.status_code(),
            AppError::Upload(UploadError::InvalidName(_)) => 400,
            AppError::Camera(AdapterError::NoCamera) => 400,
            AppError::Crypto(_) | AppError::Upload(_) | AppError::Camera(_) => 500,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code >= 500 {
            error!("{self}");
        }
        BasicResponse::failure(status_code, self.to_string()).into_response()
    }
}
