//! Generic data models for the `adapters` crate.
//!
//! These models describe the camera configuration read from `camera_config.json`
//! and the properties extracted from recorded videos, in a format the backend
//! services can use regardless of which tool produced them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Camera configuration. Every field has a default so a partial JSON file only
/// overrides the keys it names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    pub controller_path: PathBuf,
    pub iso: u32,
    pub aperture: f32,
    pub exposure_comp: String,
    pub shutter_speed: String,
    pub auto_focus: bool,
    pub compression: String,
    pub white_balance: String,
    pub counter: u32,
    pub transfer_mode: String,
    pub image_name: String,
    pub storage_path: PathBuf,
    /// Seconds to wait after launching the controller before sending commands.
    pub startup_grace_secs: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            controller_path: PathBuf::from(r"C:\Program Files (x86)\digiCamControl"),
            iso: 100,
            aperture: 2.8,
            exposure_comp: "0".to_string(),
            shutter_speed: "1/125".to_string(),
            auto_focus: true,
            compression: "RAW".to_string(),
            white_balance: "Auto".to_string(),
            counter: 0,
            transfer_mode: "Save_to_PC_only".to_string(),
            image_name: "visia_video_[Date yyyy-MM-dd]".to_string(),
            storage_path: PathBuf::from("uploads"),
            startup_grace_secs: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VideoProperties {
    pub fps: u32,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
    pub codec_fourcc: String,
}
