//! Source references: YouTube videos and uploaded audio files.
//!
//! Each source maps deterministically to a cache key, so the same video or the
//! same file contents always hit the same cached transcript.

mod local;
mod youtube;

pub use local::{is_media_file, upload_key};
pub use youtube::{extract_video_id, watch_url};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Type of media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    YouTube,
    Local,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::YouTube => write!(f, "youtube"),
            SourceType::Local => write!(f, "local"),
        }
    }
}

/// A source whose spoken content can be transcribed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// YouTube video, identified by its video ID.
    Video { url: String, video_id: String },
    /// Local audio file.
    Audio { path: PathBuf },
}

impl SourceRef {
    /// Parse a video URL or bare video ID.
    pub fn video(url: &str) -> Result<Self> {
        let video_id = extract_video_id(url)?;
        Ok(SourceRef::Video {
            url: url.trim().to_string(),
            video_id,
        })
    }

    /// Reference an uploaded audio file.
    pub fn audio(path: impl Into<PathBuf>) -> Self {
        SourceRef::Audio { path: path.into() }
    }

    /// Interpret free-form input: existing files are audio, everything else a video.
    pub fn parse(input: &str) -> Result<Self> {
        let path = PathBuf::from(input.trim());
        if path.is_file() {
            Ok(Self::audio(path))
        } else {
            Self::video(input)
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            SourceRef::Video { .. } => SourceType::YouTube,
            SourceRef::Audio { .. } => SourceType::Local,
        }
    }

    /// Cache key for this source.
    pub async fn cache_key(&self) -> Result<String> {
        match self {
            SourceRef::Video { video_id, .. } => Ok(video_id.clone()),
            SourceRef::Audio { path } => upload_key(path).await,
        }
    }

    /// Short label for logs and warnings.
    pub fn label(&self) -> String {
        match self {
            SourceRef::Video { url, .. } => url.clone(),
            SourceRef::Audio { path } => path.display().to_string(),
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.source_type(), self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_video_cache_key() {
        let source = SourceRef::video("https://www.youtube.com/watch?v=abc123&t=5").unwrap();
        assert_eq!(source.source_type(), SourceType::YouTube);
        assert_eq!(source.cache_key().await.unwrap(), "abc123");
    }

    #[test]
    fn test_parse_prefers_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("talk.mp3");
        std::fs::write(&file, b"x").unwrap();

        let parsed = SourceRef::parse(file.to_str().unwrap()).unwrap();
        assert_eq!(parsed, SourceRef::audio(&file));

        let parsed = SourceRef::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(parsed.source_type(), SourceType::YouTube);
    }
}
