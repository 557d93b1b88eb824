//! Defines the HTTP routes for recording, uploading and downloading videos.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    check_file, download_by, preview, start_video, stop_video, upload_last_created, upload_video,
};
use crate::state::SharedState;

pub fn video_router() -> Router<SharedState> {
    Router::new()
        .route("/video/digicam/startVideo", get(start_video))
        .route("/video/digicam/stopVideo", get(stop_video))
        .route("/video/digicam/preview", get(preview))
        .route("/file/checkFile", get(check_file))
        .route("/file/uploadLastCreated", post(upload_last_created))
        .route("/video/uploads", post(upload_video))
        .route("/video/downloadBy", get(download_by))
}
