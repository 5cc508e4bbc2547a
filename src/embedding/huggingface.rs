//! Hugging Face feature-extraction embeddings.

use super::Embedder;
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize)]
struct FeatureRequest<'a> {
    inputs: &'a [String],
    options: FeatureOptions,
}

#[derive(Serialize)]
struct FeatureOptions {
    wait_for_model: bool,
}

/// Embedder backed by the Hugging Face inference API.
///
/// Sentence-transformers models return one pooled vector per input. Models that
/// return per-token vectors are mean-pooled here.
pub struct HuggingFaceEmbedder {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    token: Option<String>,
    batch_size: usize,
}

impl HuggingFaceEmbedder {
    pub fn new(endpoint: &str, model: &str, token: Option<String>, batch_size: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token: token.filter(|t| !t.is_empty()),
            batch_size: batch_size.max(1),
        })
    }

    fn url(&self) -> String {
        format!("{}/pipeline/feature-extraction/{}", self.endpoint, self.model)
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut request = self.http.post(self.url()).json(&FeatureRequest {
            inputs: texts,
            options: FeatureOptions { wait_for_model: true },
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SvarError::Embedding(format!(
                "{} returned {}: {}",
                self.model,
                status,
                body.trim()
            )));
        }

        let value: Value = response.json().await?;
        let vectors = parse_vectors(&value)?;
        if vectors.len() != texts.len() {
            return Err(SvarError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            debug!("Embedding batch of {}", batch.len());
            all.extend(self.request(batch).await?);
        }
        Ok(all)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Accepts `[[f32]]` (pooled) or `[[[f32]]]` (per token, mean-pooled).
fn parse_vectors(value: &Value) -> Result<Vec<Vec<f32>>> {
    let items = value
        .as_array()
        .ok_or_else(|| SvarError::Embedding(format!("Unexpected embedding response: {}", value)))?;

    items.iter().map(parse_one).collect()
}

fn parse_one(item: &Value) -> Result<Vec<f32>> {
    let rows = item
        .as_array()
        .ok_or_else(|| SvarError::Embedding("Embedding is not an array".to_string()))?;

    match rows.first() {
        Some(Value::Array(_)) => {
            let tokens = rows
                .iter()
                .map(parse_flat)
                .collect::<Result<Vec<_>>>()?;
            mean_pool(&tokens)
        }
        _ => parse_flat(item),
    }
}

fn parse_flat(value: &Value) -> Result<Vec<f32>> {
    value
        .as_array()
        .ok_or_else(|| SvarError::Embedding("Embedding is not an array".to_string()))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| SvarError::Embedding(format!("Non-numeric embedding value: {}", v)))
        })
        .collect()
}

fn mean_pool(tokens: &[Vec<f32>]) -> Result<Vec<f32>> {
    let dim = tokens
        .first()
        .map(Vec::len)
        .ok_or_else(|| SvarError::Embedding("Empty token embeddings".to_string()))?;

    let mut sum = vec![0.0f32; dim];
    for token in tokens {
        if token.len() != dim {
            return Err(SvarError::Embedding("Ragged token embeddings".to_string()));
        }
        for (acc, v) in sum.iter_mut().zip(token) {
            *acc += v;
        }
    }
    let n = tokens.len() as f32;
    Ok(sum.into_iter().map(|v| v / n).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_parse_pooled_and_token_vectors() {
        let pooled = json!([[0.5, 1.0], [2.0, 3.0]]);
        assert_eq!(parse_vectors(&pooled).unwrap(), vec![vec![0.5, 1.0], vec![2.0, 3.0]]);

        let tokens = json!([[[1.0, 2.0], [3.0, 4.0]]]);
        assert_eq!(parse_vectors(&tokens).unwrap(), vec![vec![2.0, 3.0]]);

        assert!(parse_vectors(&json!({"error": "loading"})).is_err());
    }

    #[tokio::test]
    async fn test_embed_batch_posts_feature_extraction() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pipeline/feature-extraction/sentence-transformers/all-mpnet-base-v2")
            .match_header("authorization", "Bearer hf_test")
            .match_body(Matcher::PartialJson(json!({
                "inputs": ["first chunk", "second chunk"],
                "options": {"wait_for_model": true}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]")
            .create_async()
            .await;

        let embedder = HuggingFaceEmbedder::new(
            &server.url(),
            "sentence-transformers/all-mpnet-base-v2",
            Some("hf_test".to_string()),
            32,
        )
        .unwrap();

        let vectors = embedder
            .embed_batch(&["first chunk".to_string(), "second chunk".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![0.4, 0.5, 0.6]);
    }

    #[tokio::test]
    async fn test_embed_batch_splits_into_batches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pipeline/feature-extraction/m")
            .with_status(200)
            .with_body("[[1.0, 0.0]]")
            .expect(3)
            .create_async()
            .await;

        let embedder = HuggingFaceEmbedder::new(&server.url(), "m", None, 1).unwrap();
        let texts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        mock.assert_async().await;
        assert_eq!(vectors.len(), 3);
    }

    #[tokio::test]
    async fn test_service_error_is_embedding_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/pipeline/feature-extraction/m")
            .with_status(503)
            .with_body("{\"error\": \"Model is currently loading\"}")
            .create_async()
            .await;

        let embedder = HuggingFaceEmbedder::new(&server.url(), "m", None, 8).unwrap();
        let err = embedder.embed_batch(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, SvarError::Embedding(ref msg) if msg.contains("503")));
    }
}
