//! digiCamControl adapter implementation for camera interactions.
//!
//! This file contains the complete concrete implementation of the `CameraAdapter` trait for
//! digiCamControl, including the process management of `CameraControl.exe`, the command
//! invocation through `CameraControlRemoteCmd.exe`, and the parsing of its replies.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::errors::AdapterError;
use crate::models::CameraSettings;
use crate::CameraAdapter;

const CONTROLLER_EXE: &str = "CameraControl.exe";
const REMOTE_CMD_EXE: &str = "CameraControlRemoteCmd.exe";

/// Classification of a `CameraControlRemoteCmd` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accepted,
    NoCamera,
    Other(String),
}

/// Interprets the stdout of a remote command.
pub fn parse_reply(stdout: &str) -> Reply {
    if stdout.contains("no camera is connected") {
        Reply::NoCamera
    } else if stdout.contains("response:\"\"") || stdout.contains("response:null") {
        Reply::Accepted
    } else {
        Reply::Other(stdout.trim().to_string())
    }
}

/// Interprets the stdout of `list cameras`. Only Canon EOS bodies are supported;
/// storage controllers show up as `_??_pcistor` and are not cameras.
pub fn detect_camera(stdout: &str) -> bool {
    if stdout.contains("no camera is connected")
        || stdout.contains("response:null")
        || stdout.contains("\"_??_pcistor\"")
    {
        return false;
    }
    stdout.contains("EOS")
}

/// `set` commands that apply `settings` to the current session.
pub fn settings_commands(settings: &CameraSettings, stamp: &str) -> Vec<(String, String)> {
    vec![
        ("iso".to_string(), settings.iso.to_string()),
        ("aperture".to_string(), settings.aperture.to_string()),
        (
            "exposurecompensation".to_string(),
            settings.exposure_comp.clone(),
        ),
        ("shutterspeed".to_string(), settings.shutter_speed.clone()),
        ("compressionsetting".to_string(), settings.compression.clone()),
        ("whitebalance".to_string(), settings.white_balance.clone()),
        ("session.Counter".to_string(), settings.counter.to_string()),
        (
            "session.name".to_string(),
            format!("{}_{}", settings.image_name, stamp),
        ),
        ("transfer".to_string(), settings.transfer_mode.clone()),
        (
            "session.folder".to_string(),
            settings.storage_path.display().to_string(),
        ),
    ]
}

pub struct DigiCam {
    settings: CameraSettings,
    process: Mutex<Option<Child>>,
}

impl DigiCam {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            process: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    fn exe_dir(&self) -> &Path {
        &self.settings.controller_path
    }

    fn remote_cmd_path(&self) -> PathBuf {
        self.exe_dir().join(REMOTE_CMD_EXE)
    }

    /// Runs `CameraControlRemoteCmd.exe /c <args..>` and returns its stdout.
    async fn remote(&self, args: &[&str]) -> Result<String, AdapterError> {
        let program = self.remote_cmd_path();
        if !program.exists() {
            return Err(AdapterError::NotInstalled {
                program: REMOTE_CMD_EXE,
                path: self.exe_dir().to_path_buf(),
            });
        }

        let output = Command::new(&program)
            .arg("/c")
            .args(args)
            .current_dir(self.exe_dir())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AdapterError::Spawn {
                program: REMOTE_CMD_EXE.to_string(),
                source,
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs a command that must be acknowledged with an empty response.
    async fn expect_accepted(&self, args: &[&str]) -> Result<(), AdapterError> {
        let stdout = self.remote(args).await?;
        match parse_reply(&stdout) {
            Reply::Accepted => Ok(()),
            Reply::NoCamera => Err(AdapterError::NoCamera),
            Reply::Other(reply) => Err(AdapterError::Rejected {
                command: args.join(" "),
                reply,
            }),
        }
    }

    #[cfg(windows)]
    async fn controller_in_task_list(&self) -> bool {
        let filter = format!("IMAGENAME eq {CONTROLLER_EXE}");
        match Command::new("tasklist").args(["/FI", filter.as_str()]).output().await {
            Ok(output) => String::from_utf8_lossy(&output.stdout).contains(CONTROLLER_EXE),
            Err(e) => {
                warn!("digiCamControl: tasklist failed - {e}");
                false
            }
        }
    }

    #[cfg(not(windows))]
    async fn controller_in_task_list(&self) -> bool {
        false
    }
}

#[async_trait]
impl CameraAdapter for DigiCam {
    async fn launch(&self) -> Result<(), AdapterError> {
        if !self.remote_cmd_path().exists() {
            error!("digiCamControl: @{} - Status: Not installed", self.exe_dir().display());
            return Err(AdapterError::NotInstalled {
                program: REMOTE_CMD_EXE,
                path: self.exe_dir().to_path_buf(),
            });
        }

        if self.is_running().await {
            return Ok(());
        }

        let child = Command::new(self.exe_dir().join(CONTROLLER_EXE))
            .current_dir(self.exe_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| AdapterError::Spawn {
                program: CONTROLLER_EXE.to_string(),
                source,
            })?;
        *self.process.lock().await = Some(child);
        info!("digiCamControl: @{} - Status: UP", self.exe_dir().display());

        tokio::time::sleep(Duration::from_secs(self.settings.startup_grace_secs)).await;
        Ok(())
    }

    async fn is_running(&self) -> bool {
        let mut guard = self.process.lock().await;
        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => return true,
                Ok(Some(status)) => {
                    warn!("digiCamControl: exited with {status}");
                    *guard = None;
                }
                Err(e) => warn!("digiCamControl: cannot poll process - {e}"),
            }
        }
        drop(guard);
        self.controller_in_task_list().await
    }

    async fn is_connected(&self) -> bool {
        match self.remote(&["list", "cameras"]).await {
            Ok(stdout) => detect_camera(&stdout),
            Err(e) => {
                warn!("Camera: cannot list cameras - {e}");
                false
            }
        }
    }

    async fn start_recording(&self) -> Result<(), AdapterError> {
        self.expect_accepted(&["do", "LiveViewWnd_Show"]).await?;
        info!("Camera: Live view started");
        self.expect_accepted(&["do", "StartRecord"]).await?;
        info!("Camera: Recording started");
        Ok(())
    }

    async fn stop_recording(&self) -> Result<(), AdapterError> {
        self.expect_accepted(&["do", "StopRecord"]).await?;
        info!("Camera: Recording stopped");
        if let Err(e) = self.expect_accepted(&["do", "LiveViewWnd_Hide"]).await {
            warn!("Camera: cannot hide live view - {e}");
        }
        Ok(())
    }

    async fn capture(&self, location: &Path) -> Result<Vec<u8>, AdapterError> {
        let target = location.display().to_string();
        let program = self.remote_cmd_path();
        let output = Command::new(&program)
            .args(["/c", "capture", target.as_str()])
            .current_dir(self.exe_dir())
            .output()
            .await
            .map_err(|source| AdapterError::Spawn {
                program: REMOTE_CMD_EXE.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(AdapterError::ToolFailed {
                program: REMOTE_CMD_EXE.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        info!("Camera: Image capture - Location: {target}");

        let image = tokio::fs::read(location).await?;
        tokio::fs::remove_file(location).await?;
        Ok(image)
    }

    async fn configure(&self, settings: &CameraSettings) -> Result<(), AdapterError> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        for (property, value) in settings_commands(settings, &stamp) {
            self.expect_accepted(&["set", property.as_str(), value.as_str()]).await?;
        }
        info!("Camera configuration: {settings:?}");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), AdapterError> {
        if let Some(mut child) = self.process.lock().await.take() {
            child.kill().await?;
            info!("digiCamControl: @{} - Status: DOWN", self.exe_dir().display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_responses_are_accepted() {
        assert_eq!(parse_reply("{response:\"\"}"), Reply::Accepted);
        assert_eq!(parse_reply("response:null\r\n"), Reply::Accepted);
    }

    #[test]
    fn missing_camera_is_reported() {
        assert_eq!(
            parse_reply(":;response:\"no camera is connected\""),
            Reply::NoCamera
        );
    }

    #[test]
    fn other_replies_are_kept_verbatim() {
        assert_eq!(
            parse_reply("  unknown command  \n"),
            Reply::Other("unknown command".to_string())
        );
    }

    #[test]
    fn only_eos_bodies_count_as_cameras() {
        assert!(detect_camera("response:[\"Canon EOS 90D\"]"));
        assert!(!detect_camera("response:[\"_??_pcistor\"]"));
        assert!(!detect_camera("response:null"));
        assert!(!detect_camera("response:[\"Nikon D750\"]"));
    }

    #[test]
    fn settings_map_to_session_properties() {
        let settings = CameraSettings {
            iso: 400,
            storage_path: PathBuf::from("/data/uploads"),
            ..CameraSettings::default()
        };
        let commands = settings_commands(&settings, "20240101_120000");

        assert!(commands.contains(&("iso".to_string(), "400".to_string())));
        assert!(commands.contains(&("aperture".to_string(), "2.8".to_string())));
        assert!(commands.contains(&(
            "session.name".to_string(),
            "visia_video_[Date yyyy-MM-dd]_20240101_120000".to_string()
        )));
        assert!(commands.contains(&(
            "session.folder".to_string(),
            "/data/uploads".to_string()
        )));
    }

    #[tokio::test]
    async fn missing_installation_is_reported_on_launch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cam = DigiCam::new(CameraSettings {
            controller_path: dir.path().to_path_buf(),
            ..CameraSettings::default()
        });

        let err = cam.launch().await.expect_err("not installed");
        assert!(matches!(err, AdapterError::NotInstalled { .. }));
        assert!(!cam.is_connected().await);
    }
}
