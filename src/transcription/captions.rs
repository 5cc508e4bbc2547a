//! YouTube caption lookup.
//!
//! Caption tracks are discovered with `yt-dlp --dump-json` and downloaded in
//! YouTube's `json3` timed-text format.

use crate::error::SvarError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Why captions could not be fetched in a given language.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptionError {
    /// The video has captions, but none in the requested language.
    NotInLanguage(String),
    /// The video has no caption tracks at all.
    Disabled,
    /// Caption lookup failed (video unavailable, tool or network failure).
    Unavailable(String),
}

impl CaptionError {
    /// Convert to the library error for a given video.
    pub fn into_error(self, video_id: &str) -> SvarError {
        match self {
            CaptionError::NotInLanguage(_) | CaptionError::Unavailable(_) => {
                SvarError::NoCaptionsAvailable(video_id.to_string())
            }
            CaptionError::Disabled => SvarError::CaptionsDisabled(video_id.to_string()),
        }
    }
}

impl std::fmt::Display for CaptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionError::NotInLanguage(lang) => write!(f, "no captions in language '{}'", lang),
            CaptionError::Disabled => write!(f, "captions are disabled"),
            CaptionError::Unavailable(reason) => write!(f, "captions unavailable: {}", reason),
        }
    }
}

/// Source of caption text for a video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Caption text for `video_id` in `language`, entries joined by single spaces.
    async fn fetch(&self, video_id: &str, language: &str) -> std::result::Result<String, CaptionError>;
}

/// A caption track advertised by yt-dlp.
#[derive(Debug, Clone, Deserialize)]
struct TrackFormat {
    ext: String,
    url: String,
}

/// The subset of `yt-dlp --dump-json` output used for caption lookup.
#[derive(Debug, Default, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    subtitles: Option<HashMap<String, Vec<TrackFormat>>>,
    #[serde(default)]
    automatic_captions: Option<HashMap<String, Vec<TrackFormat>>>,
}

impl VideoInfo {
    /// json3 track URL for `language`. Uploaded subtitles win over automatic ones,
    /// and machine-translated automatic tracks are skipped.
    fn track_url(&self, language: &str) -> std::result::Result<String, CaptionError> {
        let manual = self.subtitles.as_ref().filter(|m| !m.is_empty());
        let automatic = self.automatic_captions.as_ref().filter(|m| !m.is_empty());

        if manual.is_none() && automatic.is_none() {
            return Err(CaptionError::Disabled);
        }

        let pick = |tracks: Option<&HashMap<String, Vec<TrackFormat>>>, allow_translated: bool| {
            tracks
                .and_then(|m| m.get(language))
                .and_then(|formats| {
                    formats
                        .iter()
                        .find(|f| f.ext == "json3" && (allow_translated || !f.url.contains("tlang=")))
                })
                .map(|f| f.url.clone())
        };

        pick(manual, true)
            .or_else(|| pick(automatic, false))
            .ok_or_else(|| CaptionError::NotInLanguage(language.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a json3 timed-text document into plain text.
fn timed_text_to_plain(doc: &TimedText) -> String {
    doc.events
        .iter()
        .map(|event| event.segs.iter().map(|s| s.utf8.as_str()).collect::<String>())
        .flat_map(|entry| {
            entry
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Caption source backed by yt-dlp metadata and the timed-text endpoint.
pub struct YtDlpCaptions {
    command: String,
    http: reqwest::Client,
}

impl YtDlpCaptions {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn video_info(&self, video_id: &str) -> std::result::Result<VideoInfo, CaptionError> {
        let url = crate::audio_source::watch_url(video_id);

        let output = tokio::process::Command::new(&self.command)
            .args(["--dump-json", "--skip-download", "--no-warnings", "--no-playlist", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CaptionError::Unavailable(SvarError::ToolNotFound(self.command.clone()).to_string())
                } else {
                    CaptionError::Unavailable(format!("failed to run {}: {}", self.command, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptionError::Unavailable(format!(
                "video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| CaptionError::Unavailable(format!("failed to parse yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptions {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, language: &str) -> std::result::Result<String, CaptionError> {
        let info = self.video_info(video_id).await?;
        let track_url = info.track_url(language)?;
        debug!("Downloading {} captions", language);

        let response = self
            .http
            .get(&track_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CaptionError::Unavailable(format!("caption download failed: {}", e)))?;

        let doc: TimedText = response
            .json()
            .await
            .map_err(|e| CaptionError::Unavailable(format!("invalid caption track: {}", e)))?;

        let text = timed_text_to_plain(&doc);
        if text.is_empty() {
            return Err(CaptionError::NotInLanguage(language.to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(json: &str) -> VideoInfo {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_no_tracks_means_disabled() {
        let v = info(r#"{"id":"x","subtitles":{},"automatic_captions":{}}"#);
        assert_eq!(v.track_url("en"), Err(CaptionError::Disabled));

        let v = info(r#"{"id":"x"}"#);
        assert_eq!(v.track_url("en"), Err(CaptionError::Disabled));
    }

    #[test]
    fn test_missing_language() {
        let v = info(
            r#"{"subtitles":{"hi":[{"ext":"json3","url":"https://yt/hi.json3"}]}}"#,
        );
        assert_eq!(v.track_url("en"), Err(CaptionError::NotInLanguage("en".to_string())));
        assert_eq!(v.track_url("hi").unwrap(), "https://yt/hi.json3");
    }

    #[test]
    fn test_manual_preferred_and_translations_skipped() {
        let v = info(
            r#"{
                "subtitles": {"en": [{"ext":"vtt","url":"https://yt/en.vtt"},{"ext":"json3","url":"https://yt/en.json3"}]},
                "automatic_captions": {
                    "en": [{"ext":"json3","url":"https://yt/auto-en.json3"}],
                    "hi": [{"ext":"json3","url":"https://yt/auto.json3?tlang=hi"}]
                }
            }"#,
        );
        assert_eq!(v.track_url("en").unwrap(), "https://yt/en.json3");
        assert_eq!(v.track_url("hi"), Err(CaptionError::NotInLanguage("hi".to_string())));
    }

    #[test]
    fn test_timed_text_flattening() {
        let doc: TimedText = serde_json::from_str(
            r#"{"events":[
                {"tStartMs":0,"segs":[{"utf8":"hello"},{"utf8":" world"}]},
                {"tStartMs":10},
                {"segs":[{"utf8":"\n"}]},
                {"segs":[{"utf8":"second\nline "}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(timed_text_to_plain(&doc), "hello world second line");
    }

    #[test]
    fn test_caption_error_mapping() {
        assert!(matches!(
            CaptionError::Disabled.into_error("v"),
            SvarError::CaptionsDisabled(id) if id == "v"
        ));
        assert!(matches!(
            CaptionError::NotInLanguage("hi".into()).into_error("v"),
            SvarError::NoCaptionsAvailable(_)
        ));
    }
}
