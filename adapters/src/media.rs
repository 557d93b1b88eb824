//! ffmpeg/ffprobe adapter for reading recorded videos.
//!
//! Frames are extracted with `ffmpeg` piping a single MJPEG image to stdout, and
//! stream properties come from `ffprobe`'s JSON writer.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

use crate::errors::AdapterError;
use crate::models::VideoProperties;
use crate::VideoTools;

#[derive(Debug, Clone)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_tag_string: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    nb_read_packets: Option<String>,
}

/// Parses an ffprobe rate such as `30000/1001`, truncating to whole frames.
fn parse_rate(rate: &str) -> Option<u32> {
    let (num, den) = rate.split_once('/').unwrap_or((rate, "1"));
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some((num / den) as u32)
}

/// Builds `VideoProperties` from the JSON printed by `ffprobe -of json`.
pub fn parse_probe(json: &str) -> Result<VideoProperties, AdapterError> {
    let parse_err = |reason: String| AdapterError::Parse {
        program: "ffprobe".to_string(),
        reason,
    };

    let output: ProbeOutput = serde_json::from_str(json).map_err(|e| parse_err(e.to_string()))?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| parse_err("no video stream".to_string()))?;

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse().ok())
        .or_else(|| stream.nb_read_packets.as_deref().and_then(|n| n.parse().ok()))
        .unwrap_or(0);

    Ok(VideoProperties {
        fps: stream.r_frame_rate.as_deref().and_then(parse_rate).unwrap_or(0),
        frame_count,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        codec_fourcc: stream.codec_tag_string.unwrap_or_default(),
    })
}

impl MediaTools {
    async fn run(&self, program: &Path, args: &[String]) -> Result<Vec<u8>, AdapterError> {
        let name = program.display().to_string();
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AdapterError::Spawn {
                program: name.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AdapterError::ToolFailed {
                program: name,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl VideoTools for MediaTools {
    async fn first_frame_jpeg(
        &self,
        video: &Path,
        frame_number: u64,
    ) -> Result<Vec<u8>, AdapterError> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            video.display().to_string(),
            "-vf".to_string(),
            format!("select=eq(n\\,{frame_number})"),
            "-frames:v".to_string(),
            "1".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-vcodec".to_string(),
            "mjpeg".to_string(),
            "-".to_string(),
        ];
        let jpeg = self.run(&self.ffmpeg, &args).await?;
        if jpeg.is_empty() {
            return Err(AdapterError::Parse {
                program: self.ffmpeg.display().to_string(),
                reason: format!("no frame {frame_number} in {}", video.display()),
            });
        }
        Ok(jpeg)
    }

    async fn probe(&self, video: &Path) -> Result<VideoProperties, AdapterError> {
        let args = vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-count_packets".to_string(),
            "-show_entries".to_string(),
            "stream=width,height,codec_tag_string,r_frame_rate,nb_frames,nb_read_packets"
                .to_string(),
            "-of".to_string(),
            "json".to_string(),
            video.display().to_string(),
        ];
        let stdout = self.run(&self.ffprobe, &args).await?;
        let properties = parse_probe(&String::from_utf8_lossy(&stdout))?;
        info!(
            "Video - Properties - OK - FPS: {} Frame Count: {} Resolution: {}x{} Codec: {}",
            properties.fps,
            properties.frame_count,
            properties.width,
            properties.height,
            properties.codec_fourcc
        );
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_is_mapped_to_properties() {
        let json = r#"{
            "programs": [],
            "streams": [{
                "width": 1920,
                "height": 1080,
                "codec_tag_string": "avc1",
                "r_frame_rate": "30000/1001",
                "nb_frames": "900",
                "nb_read_packets": "900"
            }]
        }"#;

        let props = parse_probe(json).expect("parse");
        assert_eq!(
            props,
            VideoProperties {
                fps: 29,
                frame_count: 900,
                width: 1920,
                height: 1080,
                codec_fourcc: "avc1".to_string(),
            }
        );
    }

    #[test]
    fn packet_count_is_used_when_frames_are_unknown() {
        let json = r#"{"streams": [{"r_frame_rate": "25/1", "nb_read_packets": "250"}]}"#;
        let props = parse_probe(json).expect("parse");
        assert_eq!(props.fps, 25);
        assert_eq!(props.frame_count, 250);
    }

    #[tokio::test]
    async fn missing_tools_report_spawn_errors() {
        let tools = MediaTools {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe"),
        };
        let video = Path::new("clip.mp4");

        assert!(matches!(
            tools.first_frame_jpeg(video, 0).await,
            Err(AdapterError::Spawn { .. })
        ));
        assert!(matches!(
            tools.probe(video).await,
            Err(AdapterError::Spawn { .. })
        ));
    }

    #[test]
    fn missing_stream_is_an_error() {
        let err = parse_probe(r#"{"streams": []}"#).expect_err("no stream");
        assert!(matches!(err, AdapterError::Parse { .. }));
    }

    #[test]
    fn zero_denominator_rate_is_ignored() {
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("24"), Some(24));
    }
}
