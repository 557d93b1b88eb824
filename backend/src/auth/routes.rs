//! Defines the HTTP routes specifically for authentication.

use axum::{routing::post, Router};

use super::handlers::{add_user, delete_user, refresh_access_token, request_access_token};
use crate::state::SharedState;

pub fn auth_router() -> Router<SharedState> {
    Router::new()
        .route("/login/addUser", post(add_user))
        .route("/login/deleteUser", post(delete_user))
        .route("/requestAccessTokenByUser", post(request_access_token))
        .route("/refreshAccessToken", post(refresh_access_token))
}
