//! Core `adapters` crate for abstracting the external programs the backend drives.
//!
//! This crate defines the `CameraAdapter` trait, which outlines the operations the
//! recording endpoints need from a camera, and `VideoTools` for reading the
//! recordings. The concrete implementations drive digiCamControl and ffmpeg/ffprobe.

pub mod digicam;
pub mod errors;
pub mod media;
pub mod models;

use std::path::Path;

use async_trait::async_trait;

pub use digicam::DigiCam;
pub use errors::AdapterError;
pub use media::MediaTools;
pub use models::{CameraSettings, VideoProperties};

/// Operations the backend performs on a recording camera.
#[async_trait]
pub trait CameraAdapter: Send + Sync {
    /// Starts the controlling program if it is not already up.
    async fn launch(&self) -> Result<(), AdapterError>;

    async fn is_running(&self) -> bool;

    /// Whether a supported camera body is plugged in.
    async fn is_connected(&self) -> bool;

    async fn start_recording(&self) -> Result<(), AdapterError>;

    async fn stop_recording(&self) -> Result<(), AdapterError>;

    /// Takes a still picture at `location`, returning the image bytes.
    /// The file is removed once read.
    async fn capture(&self, location: &Path) -> Result<Vec<u8>, AdapterError>;

    async fn configure(&self, settings: &CameraSettings) -> Result<(), AdapterError>;

    async fn shutdown(&self) -> Result<(), AdapterError>;
}

/// Reads frames and stream properties from recorded videos.
#[async_trait]
pub trait VideoTools: Send + Sync {
    /// Returns frame `frame_number` of `video` encoded as JPEG.
    async fn first_frame_jpeg(&self, video: &Path, frame_number: u64)
        -> Result<Vec<u8>, AdapterError>;

    async fn probe(&self, video: &Path) -> Result<VideoProperties, AdapterError>;
}
