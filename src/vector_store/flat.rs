//! Exact L2 nearest-neighbor index.
//!
//! Vectors are stored row-major in one contiguous buffer. Search is a full scan,
//! which is exact and fast enough for the few thousand chunks a session produces.

use crate::error::{Result, SvarError};
use std::io::Write;
use uuid::Uuid;

const MAGIC: &[u8; 8] = b"SVARFL2\x01";
const HEADER_LEN: usize = 8 + 16 + 4 + 8;

/// Flat (brute force) L2 index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build an index from equally sized vectors. Position `i` is `vectors[i]`.
    pub fn from_vectors(vectors: &[Vec<f32>]) -> Result<Self> {
        let dim = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| SvarError::InvalidInput("Cannot build an index from no vectors".to_string()))?;
        if dim == 0 {
            return Err(SvarError::Embedding("Embedding vectors are empty".to_string()));
        }

        let mut data = Vec::with_capacity(dim * vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(SvarError::Embedding(format!(
                    "Vector {} has dimension {}, expected {}",
                    i,
                    v.len(),
                    dim
                )));
            }
            data.extend_from_slice(v);
        }

        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.data.chunks_exact(self.dim).nth(position)
    }

    /// The `k` nearest positions to `query`, closest first, with squared L2 distances.
    ///
    /// `k` is capped at the index size. Equal distances keep position order, so
    /// repeated queries always rank identically.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(SvarError::IndexIntegrity(format!(
                "query has dimension {} but the index was built with {}; rebuild the index with the current embedding model",
                query.len(),
                self.dim
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| squared_l2(row, query))
            .enumerate()
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }

    /// Serialize with a header carrying the build id, dimension and count.
    pub fn write_to<W: Write>(&self, build_id: Uuid, out: &mut W) -> Result<()> {
        out.write_all(MAGIC)?;
        out.write_all(build_id.as_bytes())?;
        out.write_all(&(self.dim as u32).to_le_bytes())?;
        out.write_all(&(self.len() as u64).to_le_bytes())?;
        for value in &self.data {
            out.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Parse bytes written by [`FlatL2Index::write_to`].
    pub fn read_from(bytes: &[u8]) -> Result<(Uuid, Self)> {
        if bytes.len() < HEADER_LEN || &bytes[..8] != MAGIC {
            return Err(SvarError::IndexIntegrity("index file has an invalid header".to_string()));
        }

        let build_id = Uuid::from_slice(&bytes[8..24])
            .map_err(|e| SvarError::IndexIntegrity(format!("invalid build id: {}", e)))?;
        let dim = u32::from_le_bytes(read_array(&bytes[24..28])) as usize;
        let count = u64::from_le_bytes(read_array(&bytes[28..36])) as usize;

        let body = &bytes[HEADER_LEN..];
        let expected = dim
            .checked_mul(count)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| SvarError::IndexIntegrity("index header overflows".to_string()))?;
        if dim == 0 || count == 0 || body.len() != expected {
            return Err(SvarError::IndexIntegrity(format!(
                "index body is {} bytes, header promises {} vectors of dimension {}",
                body.len(),
                count,
                dim
            )));
        }

        let data = body
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(read_array(b)))
            .collect();

        Ok((build_id, Self { dim, data }))
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Squared Euclidean distance. Ranking by it equals ranking by L2 distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> FlatL2Index {
        FlatL2Index::from_vectors(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 3.0],
            vec![1.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_search_ranks_closest_first() {
        let results = index().search(&[0.9, 0.1], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.0).collect();
        // Positions 1 and 3 tie; lower position wins
        assert_eq!(positions, vec![1, 3, 0]);
        assert!(results[0].1 <= results[2].1);
    }

    #[test]
    fn test_top_k_capped_at_size() {
        let results = index().search(&[0.0, 0.0], 50).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|(pos, _)| *pos < 4));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = index().search(&[0.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, SvarError::IndexIntegrity(_)));
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        assert!(FlatL2Index::from_vectors(&[vec![1.0, 2.0], vec![1.0]]).is_err());
        assert!(FlatL2Index::from_vectors(&[]).is_err());
    }

    #[test]
    fn test_serialization_keeps_vectors_and_build_id() {
        let idx = index();
        let id = Uuid::new_v4();
        let mut bytes = Vec::new();
        idx.write_to(id, &mut bytes).unwrap();

        let (read_id, read) = FlatL2Index::read_from(&bytes).unwrap();
        assert_eq!(read_id, id);
        assert_eq!(read, idx);
        assert_eq!(read.vector(2), Some(&[0.0, 3.0][..]));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let mut bytes = Vec::new();
        index().write_to(Uuid::new_v4(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            FlatL2Index::read_from(&bytes),
            Err(SvarError::IndexIntegrity(_))
        ));
    }
}
