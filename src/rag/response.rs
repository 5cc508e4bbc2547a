//! Grounded answer generation over the persisted index.

use super::context::format_context_for_prompt;
use super::generation::{error_answer, TextGenerator};
use crate::config::Prompts;
use crate::error::Result;
use crate::vector_store::{EmbeddingStore, SearchResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Answer returned when nothing has been indexed yet.
pub const NO_DATA_ANSWER: &str = "No data to answer the question.";

/// Answer engine: retrieve top-k chunks, then ask the generative model.
pub struct AnswerEngine {
    store: Arc<EmbeddingStore>,
    generator: TextGenerator,
    prompts: Prompts,
}

impl AnswerEngine {
    pub fn new(store: Arc<EmbeddingStore>, generator: TextGenerator) -> Self {
        Self {
            store,
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the answer prompt for a question and its context.
    pub fn build_prompt(&self, context: &str, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        self.prompts.render_with_custom(&self.prompts.answer.template, &vars)
    }

    /// Answer `question` from the `top_k` closest chunks.
    ///
    /// A missing index yields [`NO_DATA_ANSWER`] without contacting the service.
    /// Service failures come back as an `[ERROR] ...` answer rather than an error.
    /// Retrieval failures (embedding model unavailable, corrupted index) are errors.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str, top_k: usize) -> Result<Answer> {
        let snapshot = match self.store.load().await? {
            Some(snapshot) => snapshot,
            None => {
                info!("No index available");
                return Ok(Answer {
                    text: NO_DATA_ANSWER.to_string(),
                    sources: Vec::new(),
                });
            }
        };

        let sources = self.store.search(&snapshot, question, top_k).await?;
        let context = format_context_for_prompt(&sources);
        let prompt = self.build_prompt(&context, question);

        let text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(stage = "answer", "{}", e);
                error_answer(&e)
            }
        };

        info!("Answered from {} chunks", sources.len());
        Ok(Answer { text, sources })
    }
}

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Retrieved chunks, closest first.
    pub sources: Vec<SearchResult>,
}

impl Answer {
    pub fn is_error(&self) -> bool {
        crate::cache::is_error_text(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::config::AnswerSettings;
    use crate::embedding::testing::BagOfWordsEmbedder;
    use crate::embedding::Embedder;
    use mockito::Matcher;

    fn engine(dir: &std::path::Path, endpoint: &str, token: Option<&str>) -> (AnswerEngine, Arc<EmbeddingStore>) {
        let embedder: Arc<dyn Embedder> = Arc::new(BagOfWordsEmbedder::default());
        let store = Arc::new(EmbeddingStore::new(dir, Component::ready(embedder)));
        let settings = AnswerSettings {
            endpoint: endpoint.to_string(),
            model: "test/model".to_string(),
            api_token: token.map(str::to_string),
            ..AnswerSettings::default()
        };
        let generator = TextGenerator::new(&settings).unwrap();
        (AnswerEngine::new(store.clone(), generator), store)
    }

    #[tokio::test]
    async fn test_no_index_skips_service() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let (engine, _) = engine(dir.path(), &server.url(), Some("t"));
        let answer = engine.ask("What is this about?", 5).await.unwrap();

        mock.assert_async().await;
        assert_eq!(answer.text, NO_DATA_ANSWER);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_answer_uses_ranked_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/test/model")
            .match_body(Matcher::Regex("Context:\\\\nThe borrow checker".to_string()))
            .with_status(200)
            .with_body(r#"{"generated_text": "It checks references."}"#)
            .create_async()
            .await;

        let (engine, store) = engine(dir.path(), &server.url(), Some("t"));
        store
            .build(&[
                "Cargo fetches crates from the registry.".to_string(),
                "The borrow checker validates references.".to_string(),
            ])
            .await
            .unwrap();

        let answer = engine.ask("what does the borrow checker validate", 1).await.unwrap();

        mock.assert_async().await;
        assert_eq!(answer.text, "It checks references.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].position, 1);
    }

    #[tokio::test]
    async fn test_missing_credential_is_error_answer() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let (engine, store) = engine(dir.path(), &server.url(), None);
        store.build(&["Some indexed text.".to_string()]).await.unwrap();

        let answer = engine.ask("anything?", 5).await.unwrap();

        mock.assert_async().await;
        assert!(answer.is_error());
        assert!(answer.text.contains("HF_TOKEN"));
        assert_eq!(answer.sources.len(), 1);
    }

    #[test]
    fn test_build_prompt_fills_template() {
        let dir = tempfile::tempdir().unwrap();
        let (engine, _) = engine(dir.path(), "http://localhost", None);
        let prompt = engine.build_prompt("ctx", "why?");
        assert!(prompt.contains("Context:\nctx\n\nQuestion: why?\nAnswer:"));
    }
}
