//! JSON response envelopes shared by every endpoint.
//!
//! Each body carries its own `success` flag and `status_code`; the HTTP status
//! mirrors `status_code` whenever that code is a valid final status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BasicResponse {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
}

impl BasicResponse {
    pub fn new(success: bool, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success,
            status_code,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(true, 200, message)
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(false, status_code, message)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataResponse<T> {
    #[serde(flatten)]
    pub base: BasicResponse,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(base: BasicResponse, data: T) -> Self {
        Self { base, data }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListResponse<T> {
    #[serde(flatten)]
    pub base: BasicResponse,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(base: BasicResponse, data: Vec<T>) -> Self {
        Self { base, data }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TokenResponse {
    #[serde(flatten)]
    pub base: BasicResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// HTTP status for a body `status_code`. Informational or out-of-range codes
/// such as 199 travel inside the body only.
pub fn http_status(status_code: u16) -> StatusCode {
    match status_code {
        200..=599 => StatusCode::from_u16(status_code).unwrap_or(StatusCode::OK),
        _ => StatusCode::OK,
    }
}

impl IntoResponse for BasicResponse {
    fn into_response(self) -> Response {
        (http_status(self.status_code), Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        (http_status(self.base.status_code), Json(self)).into_response()
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (http_status(self.base.status_code), Json(self)).into_response()
    }
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        (http_status(self.base.status_code), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn informational_codes_are_sent_as_ok() {
        assert_eq!(http_status(199), StatusCode::OK);
        assert_eq!(http_status(501), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(http_status(700), StatusCode::OK);
    }

    #[test]
    fn data_is_flattened_next_to_the_envelope() {
        let response = DataResponse::new(
            BasicResponse::ok("Log added: successfully"),
            json!({"id": "abc"}),
        );
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            value,
            json!({
                "success": true,
                "status_code": 200,
                "message": "Log added: successfully",
                "data": {"id": "abc"}
            })
        );
    }
}
