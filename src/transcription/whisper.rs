//! Local Whisper speech-to-text through the `whisper` command line tool.

use super::SpeechToText;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Whisper transcriber that shells out to the `whisper` CLI.
///
/// Model weights are loaded by the tool itself, so one instance can be shared
/// across submissions and model sizes.
pub struct WhisperCli {
    command: String,
}

impl WhisperCli {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    /// Check that the executable can be started.
    pub async fn probe(command: &str) -> Result<Self> {
        let result = Command::new(command)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) if status.success() => Ok(Self::new(command)),
            Ok(status) => Err(SvarError::ToolNotFound(format!(
                "{} is installed but not working correctly ({})",
                command, status
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SvarError::ToolNotFound(command.to_string()))
            }
            Err(e) => Err(SvarError::ToolNotFound(format!("{}: {}", command, e))),
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperCli {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path, model: &str) -> Result<String> {
        let out_dir = tempfile::tempdir()?;
        info!("Transcribing with whisper model '{}'", model);

        let result = Command::new(&self.command)
            .arg(audio_path)
            .arg("--model").arg(model)
            .arg("--output_format").arg("txt")
            .arg("--output_dir").arg(out_dir.path())
            .arg("--verbose").arg("False")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SvarError::ToolNotFound(self.command.clone()));
            }
            Err(e) => return Err(SvarError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            return Err(SvarError::ToolFailed(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                last_line.trim()
            )));
        }

        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let text_path = out_dir.path().join(format!("{}.txt", stem));
        let text = tokio::fs::read_to_string(&text_path).await.map_err(|e| {
            SvarError::ToolFailed(format!("no transcript written to {:?}: {}", text_path, e))
        })?;

        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(SvarError::ToolFailed("whisper returned an empty transcript".to_string()));
        }

        debug!("Transcribed {} characters", text.len());
        Ok(text)
    }
}
