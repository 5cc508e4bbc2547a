//! Uploaded audio files.

use crate::error::{Result, SvarError};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncReadExt, BufReader};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg", "opus", "aac"];

/// Containers whose audio track can be transcribed directly.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "webm"];

/// Check if path has a supported media extension.
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Cache key for an uploaded file: `local_` followed by the SHA-256 of its contents.
pub async fn upload_key(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(SvarError::InvalidInput(format!(
            "Audio file not found: {}",
            path.display()
        )));
    }
    if !is_media_file(path) {
        return Err(SvarError::InvalidInput(format!(
            "Not a recognized audio file: {}",
            path.display()
        )));
    }

    let mut reader = BufReader::new(tokio::fs::File::open(path).await?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("local_{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("talk.mp3")));
        assert!(is_media_file(Path::new("/tmp/LECTURE.WAV")));
        assert!(is_media_file(Path::new("clip.mp4")));
        assert!(!is_media_file(Path::new("notes.pdf")));
        assert!(!is_media_file(Path::new("noext")));
    }

    #[tokio::test]
    async fn test_upload_key_is_content_derived() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        let c = dir.path().join("c.mp3");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();
        std::fs::write(&c, b"other bytes").unwrap();

        let key_a = upload_key(&a).await.unwrap();
        assert!(key_a.starts_with("local_"));
        assert_eq!(key_a.len(), "local_".len() + 64);
        assert_eq!(key_a, upload_key(&a).await.unwrap());
        assert_eq!(key_a, upload_key(&b).await.unwrap());
        assert_ne!(key_a, upload_key(&c).await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_key_spans_multiple_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.wav");
        let bytes: Vec<u8> = (0..HASH_BUFFER_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &bytes).unwrap();

        let expected = format!("local_{:x}", Sha256::digest(&bytes));
        assert_eq!(upload_key(&path).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_upload_key_rejects_missing_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert!(upload_key(&dir.path().join("missing.mp3")).await.is_err());

        let doc = dir.path().join("doc.txt");
        std::fs::write(&doc, b"text").unwrap();
        assert!(upload_key(&doc).await.is_err());
    }
}
