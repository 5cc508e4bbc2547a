//! Transcript cache.
//!
//! One plain text file per source at `{cache_dir}/{key}.txt`. Presence of the file
//! is the validity check; expiry is handled by an external sweep.

use crate::error::{Result, SvarError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix marking a failed transcript. Such text is never cached.
pub const ERROR_MARKER: &str = "[ERROR]";

/// Returns true if the text is an error sentinel rather than a transcript.
pub fn is_error_text(text: &str) -> bool {
    text.trim_start().starts_with(ERROR_MARKER)
}

/// File-backed transcript cache keyed by source identity.
#[derive(Debug, Clone)]
pub struct TranscriptCache {
    root: PathBuf,
}

impl TranscriptCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SvarError::InvalidInput(format!("Invalid cache key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.txt", key)))
    }

    /// Cached transcript for `key`, if any.
    pub async fn lookup(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!("Cache hit for {}", key);
                Ok(Some(text))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a transcript. Returns false if the text was an error sentinel and
    /// therefore not written.
    pub async fn store(&self, key: &str, transcript: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        if is_error_text(transcript) {
            warn!("Refusing to cache error transcript for {}", key);
            return Ok(false);
        }

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, transcript).await?;
        debug!("Cached transcript for {} at {:?}", key, path);
        Ok(true)
    }
}
