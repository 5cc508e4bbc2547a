//! Audio extraction with yt-dlp and duration probing with ffprobe.

use super::AudioExtractor;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument};

/// Extracts the audio track of a video to `{output_dir}/{video_id}.mp3` using yt-dlp.
pub struct YtDlpExtractor {
    command: String,
}

impl YtDlpExtractor {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    #[instrument(skip(self, output_dir), fields(video_id = %video_id))]
    async fn extract(&self, url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;

        let target_path = output_dir.join(format!("{}.mp3", video_id));
        let template = output_dir.join(format!("{}.%(ext)s", video_id));

        info!("Extracting audio from {}", url);

        let result = Command::new(&self.command)
            .arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SvarError::AudioExtractionFailed(format!(
                    "{} not found in PATH",
                    self.command
                )));
            }
            Err(e) => {
                return Err(SvarError::AudioExtractionFailed(format!(
                    "{} execution failed: {e}",
                    self.command
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SvarError::AudioExtractionFailed(format!(
                "{} failed: {}",
                self.command,
                stderr.trim()
            )));
        }

        if !target_path.exists() {
            return Err(SvarError::AudioExtractionFailed(format!(
                "{} reported success but {:?} is missing",
                self.command, target_path
            )));
        }

        Ok(target_path)
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SvarError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(SvarError::ToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(SvarError::ToolFailed("ffprobe returned error".into()));
    }

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|_| SvarError::ToolFailed("Invalid ffprobe output".into()))?;

    parse_duration(&parsed)
        .ok_or_else(|| SvarError::ToolFailed("Could not determine audio duration".into()))
}

fn parse_duration(probe: &serde_json::Value) -> Option<f64> {
    probe["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
}

/// Human-readable warning for long media, if `seconds` exceeds `limit`.
pub fn long_media_warning(label: &str, seconds: f64, limit: u32) -> Option<String> {
    if seconds > limit as f64 {
        Some(format!(
            "{} is long ({} min). Transcription may take a while.",
            label,
            (seconds / 60.0) as u32
        ))
    } else {
        None
    }
}
