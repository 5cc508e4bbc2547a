//! Persisted embedding store.
//!
//! Each build replaces the previous snapshot in full. The index and the chunk
//! list are written to temporary files and renamed into place, and both carry
//! the same build id so a half-published pair is detected on load.

use super::{FlatL2Index, SearchResult};
use crate::component::Component;
use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// File name of the serialized index under the store root.
pub const INDEX_FILE: &str = "index.bin";
/// File name of the serialized chunk sequence under the store root.
pub const CHUNKS_FILE: &str = "chunks.json";

#[derive(Debug, Serialize, Deserialize)]
struct ChunkFile {
    build_id: Uuid,
    model: String,
    built_at: DateTime<Utc>,
    chunks: Vec<String>,
}

/// An index paired positionally with the chunks it was built from.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub build_id: Uuid,
    /// Embedding model the vectors came from.
    pub model: String,
    pub built_at: DateTime<Utc>,
    index: FlatL2Index,
    chunks: Vec<String>,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    /// Nearest chunks to an already embedded query, closest first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.index
            .search(query, top_k)?
            .into_iter()
            .map(|(position, distance)| {
                let chunk = self.chunks.get(position).cloned().ok_or_else(|| {
                    SvarError::IndexIntegrity(format!("index position {} has no chunk", position))
                })?;
                Ok(SearchResult {
                    position,
                    chunk,
                    distance,
                })
            })
            .collect()
    }
}

/// Builds, persists and reloads embedding snapshots.
pub struct EmbeddingStore {
    root: PathBuf,
    embedder: Component<dyn Embedder>,
}

impl EmbeddingStore {
    pub fn new(root: impl Into<PathBuf>, embedder: Component<dyn Embedder>) -> Self {
        Self {
            root: root.into(),
            embedder,
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.root.join(CHUNKS_FILE)
    }

    /// The shared embedder, or `EmbeddingUnavailable`.
    pub fn embedder(&self) -> Result<&Arc<dyn Embedder>> {
        self.embedder
            .get()
            .map_err(|reason| SvarError::EmbeddingUnavailable(reason.to_string()))
    }

    /// Encode every chunk, build a fresh index and publish it, replacing any prior build.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn build(&self, chunks: &[String]) -> Result<IndexSnapshot> {
        if chunks.is_empty() {
            return Err(SvarError::InvalidInput("No chunks to index".to_string()));
        }

        let embedder = self.embedder()?;
        let vectors = embedder.embed_batch(chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(SvarError::Embedding(format!(
                "Embedded {} of {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let snapshot = IndexSnapshot {
            build_id: Uuid::new_v4(),
            model: embedder.model_name().to_string(),
            built_at: Utc::now(),
            index: FlatL2Index::from_vectors(&vectors)?,
            chunks: chunks.to_vec(),
        };

        let root = self.root.clone();
        let to_publish = snapshot.clone();
        tokio::task::spawn_blocking(move || publish(&root, &to_publish))
            .await
            .map_err(|e| SvarError::Io(std::io::Error::other(e)))??;

        info!(
            "Indexed {} chunks (dimension {}, build {})",
            snapshot.len(),
            snapshot.index.dim(),
            snapshot.build_id
        );
        Ok(snapshot)
    }

    /// Load the published snapshot. `Ok(None)` if either artifact is missing.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<IndexSnapshot>> {
        let index_bytes = match read_optional(&self.index_path()).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let chunk_bytes = match read_optional(&self.chunks_path()).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let (index_build, index) = FlatL2Index::read_from(&index_bytes)?;
        let file: ChunkFile = serde_json::from_slice(&chunk_bytes)
            .map_err(|e| SvarError::IndexIntegrity(format!("unreadable chunk file: {}", e)))?;

        if index_build != file.build_id {
            return Err(SvarError::IndexIntegrity(format!(
                "index build {} does not match chunk build {}",
                index_build, file.build_id
            )));
        }
        if index.len() != file.chunks.len() {
            return Err(SvarError::IndexIntegrity(format!(
                "index holds {} vectors but {} chunks were stored",
                index.len(),
                file.chunks.len()
            )));
        }

        debug!("Loaded build {} with {} chunks", file.build_id, file.chunks.len());
        Ok(Some(IndexSnapshot {
            build_id: file.build_id,
            model: file.model,
            built_at: file.built_at,
            index,
            chunks: file.chunks,
        }))
    }

    /// Embed a question and retrieve the nearest chunks from `snapshot`.
    ///
    /// The question must be embedded by the same model that built the snapshot.
    pub async fn search(&self, snapshot: &IndexSnapshot, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let embedder = self.embedder()?;
        if embedder.model_name() != snapshot.model {
            return Err(SvarError::IndexIntegrity(format!(
                "index was built with '{}' but the current embedding model is '{}'",
                snapshot.model,
                embedder.model_name()
            )));
        }

        let query = embedder.embed(question).await?;
        snapshot.search(&query, top_k)
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{:?} not found", path);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Write both artifacts to temporary files, then rename them into place.
fn publish(root: &Path, snapshot: &IndexSnapshot) -> Result<()> {
    std::fs::create_dir_all(root)?;

    let mut index_tmp = NamedTempFile::new_in(root)?;
    {
        let mut writer = std::io::BufWriter::new(index_tmp.as_file_mut());
        snapshot.index.write_to(snapshot.build_id, &mut writer)?;
        writer.flush()?;
    }
    index_tmp.as_file().sync_all()?;

    let mut chunks_tmp = NamedTempFile::new_in(root)?;
    let file = ChunkFile {
        build_id: snapshot.build_id,
        model: snapshot.model.clone(),
        built_at: snapshot.built_at,
        chunks: snapshot.chunks.clone(),
    };
    serde_json::to_writer(chunks_tmp.as_file_mut(), &file)?;
    chunks_tmp.as_file().sync_all()?;

    index_tmp
        .persist(root.join(INDEX_FILE))
        .map_err(|e| SvarError::Io(e.error))?;
    if let Err(e) = chunks_tmp.persist(root.join(CHUNKS_FILE)) {
        warn!("Index published without its chunk list; the next load will reject it");
        return Err(SvarError::Io(e.error));
    }
    Ok(())
}
