//! Embedding generation for retrieval.

mod huggingface;
mod openai;

pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAIEmbedder;

use crate::component::Component;
use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SvarError::Embedding("Empty embedding response".to_string()))
    }

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Build the configured embedder, or record why it is unavailable.
pub fn create_embedder(settings: &EmbeddingSettings, hf_token: Option<String>) -> Component<dyn Embedder> {
    let built: Result<Arc<dyn Embedder>> = match settings.provider {
        EmbeddingProvider::HuggingFace => HuggingFaceEmbedder::new(
            &settings.endpoint,
            &settings.model,
            hf_token,
            settings.batch_size,
        )
        .map(|e| Arc::new(e) as Arc<dyn Embedder>),
        EmbeddingProvider::OpenAI => OpenAIEmbedder::new(
            &settings.model,
            settings.dimensions as usize,
            settings.batch_size,
        )
        .map(|e| Arc::new(e) as Arc<dyn Embedder>),
    };

    match built {
        Ok(embedder) => Component::ready(embedder),
        Err(e) => {
            warn!("Embedding model {} unavailable: {}", settings.model, e);
            Component::unavailable(e.to_string())
        }
    }
}
