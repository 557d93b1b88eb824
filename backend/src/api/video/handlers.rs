//! Handler functions for the video recording and storage API.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::database::{LogType, VideoFilter};
use crate::errors::AppError;
use crate::responses::{BasicResponse, DataResponse, ListResponse};
use crate::services::{
    audit,
    uploads::{secure_filename, UploadError},
};
use crate::state::SharedState;
use crate::utils::now_standard;

const UNKNOWN: &str = "UNK";

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct FramePreview {
    pub frame_number: u64,
    pub frame_base64: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct VideoId {
    pub id: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct LastCreated {
    #[serde(rename = "crdId")]
    pub crd_id: Option<String>,
}

/// Launches the camera program when it is not up yet. Launch failures are
/// left for the next camera command to surface.
async fn ensure_camera_running(state: &SharedState) {
    if !state.camera.is_running().await {
        warn!("digiCamControl isn't running");
        if let Err(e) = state.camera.launch().await {
            warn!("digiCamControl not launched: {e}");
        }
    }
}

pub async fn start_video(State(state): State<SharedState>) -> Result<BasicResponse, AppError> {
    if !state.camera.is_connected().await {
        warn!("GET /video/digicam/startVideo - Camera not connected");
        return Ok(BasicResponse::failure(400, "Camera not connected"));
    }
    ensure_camera_running(&state).await;

    match state.camera.start_recording().await {
        Ok(()) => Ok(BasicResponse::ok("Video recording started")),
        Err(adapters::AdapterError::Rejected { command, reply }) => {
            warn!("digiCamControl refused '{command}': {reply}");
            Ok(BasicResponse::failure(400, "Video recording not started"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn stop_video(State(state): State<SharedState>) -> Result<BasicResponse, AppError> {
    state.uploads.refresh_snapshot().await?;
    match state.camera.stop_recording().await {
        Ok(()) => Ok(BasicResponse::ok("Camera: Recording stopped")),
        Err(e) => Ok(BasicResponse::failure(500, e.to_string())),
    }
}

/// Records a short clip and returns its first frame as a base64 JPEG.
pub async fn preview(State(state): State<SharedState>) -> Result<Response, AppError> {
    if !state.camera.is_connected().await {
        warn!("GET /video/digicam/preview - Camera not connected");
        return Ok(BasicResponse::failure(400, "Camera not connected").into_response());
    }
    ensure_camera_running(&state).await;

    if let Err(e) = state.camera.start_recording().await {
        return Ok(BasicResponse::failure(501, e.to_string()).into_response());
    }
    state.uploads.refresh_snapshot().await?;
    let previous = state.uploads.snapshot().await;
    tokio::time::sleep(state.config.backend.preview_recording()).await;

    if let Err(e) = state.camera.stop_recording().await {
        return Ok(BasicResponse::failure(501, e.to_string()).into_response());
    }

    let settings = &state.config.backend;
    let arrived = state
        .uploads
        .wait_for_new_file(&previous, settings.preview_timeout(), settings.poll_interval())
        .await?;
    let newest = match state.uploads.newest_file().await? {
        Some(path) if arrived => path,
        _ => {
            warn!("GET /video/digicam/preview - Video recorded but not uploaded");
            return Ok(
                BasicResponse::failure(501, "Video recorded but not uploaded").into_response(),
            );
        }
    };

    let frame = state.media.first_frame_jpeg(&newest, 0).await;
    state.uploads.delete_all().await?;
    match frame {
        Ok(jpeg) => Ok(DataResponse::new(
            BasicResponse::ok("Frame for preview"),
            FramePreview {
                frame_number: 0,
                frame_base64: STANDARD.encode(jpeg),
            },
        )
        .into_response()),
        Err(e) => {
            warn!("Error reading frame from video: {e}");
            Ok(BasicResponse::failure(501, "Error reading frame from video").into_response())
        }
    }
}

/// Waits for any file to show up in the uploads folder.
pub async fn check_file(State(state): State<SharedState>) -> Result<BasicResponse, AppError> {
    let settings = &state.config.backend;
    let found = state
        .uploads
        .wait_for_new_file(
            &HashSet::new(),
            settings.check_file_timeout(),
            settings.poll_interval(),
        )
        .await?;
    state.uploads.refresh_snapshot().await?;

    match state.uploads.newest_file().await? {
        Some(path) if found => {
            info!("New file found: {}", path.display());
            Ok(BasicResponse::ok(format!(
                "New file found: {}",
                path.display()
            )))
        }
        _ => {
            warn!("Nothing found in {}", state.uploads.path().display());
            Ok(BasicResponse::failure(500, "No new files found"))
        }
    }
}

/// Encrypts and stores the newest recording, then empties the uploads folder.
pub async fn upload_last_created(
    State(state): State<SharedState>,
    payload: Result<Json<LastCreated>, JsonRejection>,
) -> Result<BasicResponse, AppError> {
    let Json(request) = payload?;
    let crd_id = request
        .crd_id
        .filter(|crd| !crd.is_empty())
        .unwrap_or_else(|| {
            warn!("POST /file/uploadLastCreated - CRD_ID missed!!");
            UNKNOWN.to_string()
        });

    let filename = secure_filename(&format!("{crd_id}_{}.mp4", now_standard()))?;
    let video_path = state
        .uploads
        .newest_file()
        .await?
        .ok_or(UploadError::Empty)?;
    let video = tokio::fs::read(&video_path)
        .await
        .map_err(UploadError::Io)?;
    state.uploads.delete_all().await?;
    info!("File read & erased: {}", video_path.display());

    let token = state.encryptor.encrypt(&video);
    let store = state.store.as_ref();
    match store
        .insert_video(&crd_id, &filename, token.into_bytes())
        .await
    {
        Ok(_) => {
            let message = format!("Video recorded and upload: {filename}");
            audit::record(store, LogType::Info, message).await;
            Ok(BasicResponse::ok("Video recorded & Saved"))
        }
        Err(e) => {
            let message = format!("Video Recorded but not uploaded: {filename} ({e})");
            audit::record(store, LogType::Error, message).await;
            Ok(BasicResponse::failure(501, "Video recorded but not uploaded."))
        }
    }
}

/// Stores a video sent by the frontend as `multipart/form-data`.
pub async fn upload_video(
    State(state): State<SharedState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart?;
    let mut video: Option<Vec<u8>> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "video" {
            video = Some(field.bytes().await?.to_vec());
        } else {
            let value = field.text().await?;
            if !value.is_empty() {
                fields.insert(name, value);
            }
        }
    }

    let Some(video) = video.filter(|bytes| !bytes.is_empty()) else {
        return Ok(BasicResponse::failure(400, "No file received").into_response());
    };

    let field = |key: &str| {
        fields
            .get(key)
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_string())
    };
    let crd_id = field("crd_id");
    let patient_id = field("patient_id");
    let file_name = match fields.get("file_name") {
        Some(name) => secure_filename(name)?,
        None => secure_filename(&format!("{crd_id}--{patient_id}--{}.mkv", now_standard()))?,
    };
    info!(
        "FrontEnd: Data send by {} - CRD: {crd_id} - Patient: {patient_id} - File: {file_name}",
        user.username
    );

    if state.config.backend.keep_upload_copies {
        let path = state.uploads.write_file(&file_name, &video).await?;
        info!("BackEnd: Video saved - File: {}", path.display());
    }

    let token = state.encryptor.encrypt(&video);
    let store = state.store.as_ref();
    let id = match store
        .insert_video(&crd_id, &file_name, token.into_bytes())
        .await
    {
        Ok(id) => id,
        Err(e) => {
            let message = format!("Video not uploaded: {file_name} ({e})");
            audit::record(store, LogType::Error, message).await;
            return Err(e.into());
        }
    };
    audit::record(store, LogType::Info, format!("Video uploaded: {file_name}")).await;

    let base = if crd_id == UNKNOWN || file_name.contains(UNKNOWN) {
        BasicResponse::new(true, 199, "Video uploaded, but missing parameters")
    } else {
        BasicResponse::ok("Video added: successfully")
    };
    Ok(DataResponse::new(base, VideoId { id: id.to_hex() }).into_response())
}

/// Decrypts the matching videos into the uploads folder.
pub async fn download_by(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let filter = VideoFilter::from_params(&params)?;
    let store = state.store.as_ref();
    let videos = store.find_videos(&filter).await?;
    if videos.is_empty() {
        let message = format!("Video/s not found: {params:?}");
        audit::record(store, LogType::Warning, message).await;
        return Ok(BasicResponse::failure(400, "Video/s not found").into_response());
    }

    let mut found = Vec::with_capacity(videos.len());
    for video in videos {
        let contents = state.encryptor.decrypt_bytes(&video.contents)?;
        let path = state.uploads.write_file(&video.filename, &contents).await?;
        if let Err(e) = state.media.probe(&path).await {
            warn!("Video - Properties - Error - {}: {e}", path.display());
        }
        found.push(video.filename);
    }

    let message = format!("Video/s downloaded successfully: {found:?}");
    audit::record(store, LogType::Info, message).await;
    Ok(ListResponse::new(BasicResponse::ok("Videos downloaded successfully"), found).into_response())
}
