//! Vector storage for retrieval.
//!
//! An exact L2 index over chunk embeddings, persisted as a snapshot that is
//! rebuilt in full on every build.

mod flat;
mod store;

pub use flat::{squared_l2, FlatL2Index};
pub use store::{EmbeddingStore, IndexSnapshot, CHUNKS_FILE, INDEX_FILE};

/// A retrieved chunk with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Position in the chunk sequence (and the index).
    pub position: usize,
    /// Chunk text.
    pub chunk: String,
    /// Squared L2 distance (lower is closer).
    pub distance: f32,
}
