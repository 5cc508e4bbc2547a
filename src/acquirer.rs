//! Transcript acquisition with fallbacks.
//!
//! Videos: captions in each configured language, then extracted audio through
//! speech-to-text at decreasing model sizes. Uploaded audio goes straight to
//! speech-to-text. Each stage reports success or a reason, and only exhausting
//! every stage fails the source.

use crate::audio::{long_media_warning, probe_duration, AudioExtractor};
use crate::audio_source::SourceRef;
use crate::component::Component;
use crate::config::Settings;
use crate::error::{Result, SvarError, TierFailure};
use crate::transcription::{detect_and_tag, CaptionError, CaptionSource, SpeechToText};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a transcript came from.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOrigin {
    Captions { language: String },
    SpeechToText { model: String },
}

/// A freshly acquired, language-tagged transcript.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub transcript: String,
    pub origin: TranscriptOrigin,
    /// Non-fatal notices for the user (e.g. long media).
    pub warnings: Vec<String>,
}

/// Fallback policy for acquisition.
#[derive(Debug, Clone)]
pub struct AcquisitionPolicy {
    /// Caption languages, tried in order.
    pub caption_languages: Vec<String>,
    /// Model sizes for extracted video audio, largest first.
    pub video_tiers: Vec<String>,
    /// Model sizes for uploaded audio, largest first.
    pub upload_tiers: Vec<String>,
    /// Directory for extracted audio.
    pub temp_audio_dir: PathBuf,
    pub long_video_warning_seconds: u32,
    pub long_upload_warning_seconds: u32,
}

impl AcquisitionPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            caption_languages: settings.captions.languages(),
            video_tiers: settings.transcription.video_tiers(),
            upload_tiers: settings.transcription.upload_tiers(),
            temp_audio_dir: settings.temp_audio_dir(),
            long_video_warning_seconds: settings.transcription.long_video_warning_seconds,
            long_upload_warning_seconds: settings.transcription.long_upload_warning_seconds,
        }
    }
}

/// Resolves transcripts for videos and uploaded audio.
pub struct TranscriptAcquirer {
    captions: Arc<dyn CaptionSource>,
    extractor: Arc<dyn AudioExtractor>,
    speech: Component<dyn SpeechToText>,
    policy: AcquisitionPolicy,
}

impl TranscriptAcquirer {
    pub fn new(
        captions: Arc<dyn CaptionSource>,
        extractor: Arc<dyn AudioExtractor>,
        speech: Component<dyn SpeechToText>,
        policy: AcquisitionPolicy,
    ) -> Self {
        Self {
            captions,
            extractor,
            speech,
            policy,
        }
    }

    pub fn policy(&self) -> &AcquisitionPolicy {
        &self.policy
    }

    /// Acquire a transcript for any source.
    pub async fn acquire(&self, source: &SourceRef) -> Result<Acquired> {
        match source {
            SourceRef::Video { url, video_id } => self.acquire_video(url, video_id).await,
            SourceRef::Audio { path } => self.acquire_upload(path).await,
        }
    }

    /// Captions first, then extracted audio through speech-to-text.
    #[instrument(skip(self, url), fields(video_id = %video_id))]
    pub async fn acquire_video(&self, url: &str, video_id: &str) -> Result<Acquired> {
        match self.caption_text(video_id).await {
            Ok((text, language)) => {
                info!("Using {} captions", language);
                return Ok(Acquired {
                    transcript: detect_and_tag(&text),
                    origin: TranscriptOrigin::Captions { language },
                    warnings: Vec::new(),
                });
            }
            Err(e) => {
                let err = e.clone().into_error(video_id);
                warn!(stage = "captions", "{} ({}), falling back to audio transcription", err, e);
            }
        }

        let audio_path = self
            .extractor
            .extract(url, video_id, &self.policy.temp_audio_dir)
            .await
            .map_err(|e| match e {
                SvarError::AudioExtractionFailed(_) => e,
                other => SvarError::AudioExtractionFailed(other.to_string()),
            })?;

        let mut warnings = Vec::new();
        if let Some(w) = self
            .duration_warning(&audio_path, &format!("Video {}", url), self.policy.long_video_warning_seconds)
            .await
        {
            warnings.push(w);
        }

        let result = self.transcribe_tiers(&audio_path, &self.policy.video_tiers).await;
        remove_temp_audio(&audio_path).await;

        let (text, model) = result?;
        Ok(Acquired {
            transcript: detect_and_tag(&text),
            origin: TranscriptOrigin::SpeechToText { model },
            warnings,
        })
    }

    /// Speech-to-text on an uploaded file. The file itself is left in place.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn acquire_upload(&self, path: &Path) -> Result<Acquired> {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mut warnings = Vec::new();
        if let Some(w) = self
            .duration_warning(path, &format!("Uploaded audio {}", label), self.policy.long_upload_warning_seconds)
            .await
        {
            warnings.push(w);
        }

        let (text, model) = self.transcribe_tiers(path, &self.policy.upload_tiers).await?;
        Ok(Acquired {
            transcript: detect_and_tag(&text),
            origin: TranscriptOrigin::SpeechToText { model },
            warnings,
        })
    }

    /// Try each caption language in order.
    ///
    /// A missing language moves on to the next one; disabled or unavailable
    /// captions end the caption stage immediately.
    async fn caption_text(&self, video_id: &str) -> std::result::Result<(String, String), CaptionError> {
        let mut last = CaptionError::Unavailable("no caption languages configured".to_string());

        for language in &self.policy.caption_languages {
            match self.captions.fetch(video_id, language).await {
                Ok(text) => return Ok((text, language.clone())),
                Err(CaptionError::NotInLanguage(lang)) => {
                    debug!("No captions in {}", lang);
                    last = CaptionError::NotInLanguage(lang);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last)
    }

    /// Run speech-to-text at each model size until one succeeds.
    async fn transcribe_tiers(&self, audio_path: &Path, tiers: &[String]) -> Result<(String, String)> {
        let mut failures = Vec::with_capacity(tiers.len());

        let engine = match self.speech.get() {
            Ok(engine) => engine,
            Err(reason) => {
                warn!(stage = "speech-to-text", "Speech-to-text unavailable: {}", reason);
                let failures = tiers
                    .iter()
                    .map(|model| TierFailure {
                        model: model.clone(),
                        error: format!("speech-to-text unavailable: {}", reason),
                    })
                    .collect();
                return Err(SvarError::TranscriptionFailed(failures));
            }
        };

        for model in tiers {
            match engine.transcribe(audio_path, model).await {
                Ok(text) => return Ok((text, model.clone())),
                Err(e) => {
                    warn!(stage = "speech-to-text", "Model '{}' failed: {}", model, e);
                    failures.push(TierFailure {
                        model: model.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(SvarError::TranscriptionFailed(failures))
    }

    async fn duration_warning(&self, path: &Path, label: &str, limit: u32) -> Option<String> {
        match probe_duration(path).await {
            Ok(seconds) => long_media_warning(label, seconds, limit),
            Err(e) => {
                debug!("Could not probe duration of {:?}: {}", path, e);
                None
            }
        }
    }
}

/// Delete an extracted audio file, logging instead of failing.
async fn remove_temp_audio(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed temporary audio {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temporary audio {:?}: {}", path, e),
    }
}
