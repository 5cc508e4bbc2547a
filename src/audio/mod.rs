//! Audio extraction for videos without usable captions.

mod downloader;

pub use downloader::{long_media_warning, probe_duration, YtDlpExtractor};

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Extracts an audio track from a remote video.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Extract audio for `url` into `output_dir`, returning the audio file path.
    ///
    /// Fails with `AudioExtractionFailed` if the tool exits non-zero or the
    /// output file is missing.
    async fn extract(&self, url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf>;
}
