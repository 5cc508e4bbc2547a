//! Error types for Svar.

use thiserror::Error;

/// One failed speech-to-text attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TierFailure {
    /// Model size that was tried.
    pub model: String,
    /// Last error reported for that model.
    pub error: String,
}

impl std::fmt::Display for TierFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.model, self.error)
    }
}

fn join_tiers(tiers: &[TierFailure]) -> String {
    if tiers.is_empty() {
        return "no model sizes configured".to_string();
    }
    tiers
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Library-level error type for Svar operations.
#[derive(Error, Debug)]
pub enum SvarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No captions available for video {0}")]
    NoCaptionsAvailable(String),

    #[error("Captions are disabled for video {0}")]
    CaptionsDisabled(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtractionFailed(String),

    #[error("Transcription failed on every model size: {}", join_tiers(.0))]
    TranscriptionFailed(Vec<TierFailure>),

    #[error("Embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("No index has been built yet")]
    IndexMissing,

    #[error("Index integrity violation: {0}")]
    IndexIntegrity(String),

    #[error("Answer service unavailable: {0}")]
    AnswerServiceUnavailable(String),

    #[error("Unrecognized answer service response: {0}")]
    MalformedServiceResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Svar operations.
pub type Result<T> = std::result::Result<T, SvarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_failed_lists_every_tier() {
        let err = SvarError::TranscriptionFailed(vec![
            TierFailure {
                model: "small".to_string(),
                error: "out of memory".to_string(),
            },
            TierFailure {
                model: "tiny".to_string(),
                error: "exit status 1".to_string(),
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains("small: out of memory"));
        assert!(msg.contains("tiny: exit status 1"));
    }

    #[test]
    fn test_transcription_failed_without_tiers() {
        let err = SvarError::TranscriptionFailed(Vec::new());
        assert!(err.to_string().contains("no model sizes configured"));
    }
}
