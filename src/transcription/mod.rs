//! Transcription sources for Svar.
//!
//! - **Captions**: YouTube caption tracks, fetched per language.
//! - **Whisper**: local speech-to-text on extracted or uploaded audio, run at a
//!   given model size so callers can degrade to smaller models.
//! - **Language**: dominant-language detection used to tag finished transcripts.

mod captions;
pub mod language;
mod whisper;

pub use captions::{CaptionError, CaptionSource, YtDlpCaptions};
pub use language::{detect_and_tag, detect_language, tag_transcript};
pub use whisper::WhisperCli;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for speech-to-text engines.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file with the given model size and return plain text.
    async fn transcribe(&self, audio_path: &Path, model: &str) -> Result<String>;
}
