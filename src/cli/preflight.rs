//! Pre-flight checks before expensive operations.
//!
//! Reports missing tools or credentials up front. The pipeline degrades per
//! source, so callers print these as warnings instead of aborting.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{Result, SvarError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Videos need the extraction tool (captions and audio).
    Video,
    /// Uploaded audio needs the speech-to-text tool.
    Upload,
    /// Answering needs the embedding and answer service credentials.
    Answer,
}

/// Run pre-flight checks for the given operation.
///
/// Returns every problem found, or Ok(()) if all checks pass.
pub fn check(operation: Operation, settings: &Settings) -> std::result::Result<(), Vec<SvarError>> {
    let results = match operation {
        Operation::Video => vec![
            check_tool(&settings.transcription.extractor),
            check_tool("ffmpeg"),
            check_tool(&settings.transcription.command),
        ],
        Operation::Upload => vec![check_tool(&settings.transcription.command), check_tool("ffprobe")],
        Operation::Answer => {
            let mut results = vec![check_hf_token(settings)];
            if settings.embedding.provider == EmbeddingProvider::OpenAI {
                results.push(check_env_key("OPENAI_API_KEY"));
            }
            results
        }
    };

    let problems: Vec<SvarError> = results.into_iter().filter_map(|r| r.err()).collect();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Check that the answer service credential is configured.
fn check_hf_token(settings: &Settings) -> Result<()> {
    match settings.answer.api_token.as_deref() {
        Some(token) if !token.is_empty() => Ok(()),
        _ => Err(SvarError::Config(
            "HF_TOKEN not set; answers will be errors. Set it with: export HF_TOKEN='hf_...'".to_string(),
        )),
    }
}

fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(key) if !key.is_empty() => Ok(()),
        _ => Err(SvarError::Config(format!("{} not set", name))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    let version_arg = version_arg(name);
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SvarError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SvarError::ToolNotFound(name.to_string())),
        Err(e) => Err(SvarError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// Argument that makes a tool print something and exit zero.
pub fn version_arg(name: &str) -> &'static str {
    let base = std::path::Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    match base {
        "ffmpeg" | "ffprobe" => "-version",
        // whisper has no version flag
        "whisper" => "--help",
        _ => "--version",
    }
}
