//! Pipeline orchestrator for Svar.
//!
//! Runs one question submission end to end: acquire (through the cache) → chunk
//! → build the index → answer. Stages run strictly one after another.

use crate::acquirer::{AcquisitionPolicy, TranscriptAcquirer, TranscriptOrigin};
use crate::audio::{AudioExtractor, YtDlpExtractor};
use crate::audio_source::SourceRef;
use crate::cache::TranscriptCache;
use crate::chunking::SentenceChunker;
use crate::component::Component;
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::Result;
use crate::rag::{Answer, AnswerEngine, TextGenerator, NO_DATA_ANSWER};
use crate::transcription::{CaptionSource, SpeechToText, WhisperCli, YtDlpCaptions};
use crate::vector_store::EmbeddingStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Warning shown when no source produced any text.
pub const NO_TRANSCRIPTS_WARNING: &str = "No valid transcripts found. Please check your inputs.";

/// One answered question in the current session.
#[derive(Debug, Clone)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// A transcript together with where it came from.
#[derive(Debug, Clone)]
pub struct TranscriptOutcome {
    pub text: String,
    /// `None` when served from the cache.
    pub origin: Option<TranscriptOrigin>,
    pub warnings: Vec<String>,
}

impl TranscriptOutcome {
    pub fn from_cache(&self) -> bool {
        self.origin.is_none()
    }
}

/// Outcome of one submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionResult {
    /// `None` if the submission stopped before the answer step.
    pub answer: Option<Answer>,
    /// Per-source and pipeline warnings, in the order they occurred.
    pub warnings: Vec<String>,
    /// Sources that produced a transcript.
    pub sources_processed: usize,
    /// Chunks indexed for this submission.
    pub chunks_indexed: usize,
}

/// The main orchestrator for the Svar pipeline.
pub struct Orchestrator {
    settings: Settings,
    cache: TranscriptCache,
    acquirer: TranscriptAcquirer,
    chunker: SentenceChunker,
    store: Arc<EmbeddingStore>,
    engine: AnswerEngine,
    history: Vec<QaRecord>,
}

impl Orchestrator {
    /// Create an orchestrator with the production components.
    ///
    /// The speech-to-text engine and the embedder are set up once here. Either may
    /// end up `Unavailable`; that is reported when a stage needs it.
    pub async fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let speech: Component<dyn SpeechToText> =
            match WhisperCli::probe(&settings.transcription.command).await {
                Ok(whisper) => Component::ready(Arc::new(whisper) as Arc<dyn SpeechToText>),
                Err(e) => {
                    warn!("Speech-to-text unavailable: {}", e);
                    Component::unavailable(e.to_string())
                }
            };

        let embedder = create_embedder(&settings.embedding, settings.answer.api_token.clone());

        let captions: Arc<dyn CaptionSource> = Arc::new(YtDlpCaptions::new(&settings.transcription.extractor));
        let extractor: Arc<dyn AudioExtractor> = Arc::new(YtDlpExtractor::new(&settings.transcription.extractor));

        Self::with_components(settings, prompts, captions, extractor, speech, embedder)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        captions: Arc<dyn CaptionSource>,
        extractor: Arc<dyn AudioExtractor>,
        speech: Component<dyn SpeechToText>,
        embedder: Component<dyn Embedder>,
    ) -> Result<Self> {
        let cache_dir = settings.cache_dir();
        let cache = TranscriptCache::new(&cache_dir);
        let acquirer = TranscriptAcquirer::new(
            captions,
            extractor,
            speech,
            AcquisitionPolicy::from_settings(&settings),
        );
        let chunker = SentenceChunker::new(settings.chunking.max_words);
        let store = Arc::new(EmbeddingStore::new(&cache_dir, embedder));
        let engine = AnswerEngine::new(store.clone(), TextGenerator::new(&settings.answer)?).with_prompts(prompts);

        Ok(Self {
            settings,
            cache,
            acquirer,
            chunker,
            store,
            engine,
            history: Vec::new(),
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Questions answered so far in this session, oldest first.
    pub fn history(&self) -> &[QaRecord] {
        &self.history
    }

    /// Get a reference to the embedding store.
    pub fn store(&self) -> Arc<EmbeddingStore> {
        self.store.clone()
    }

    /// Transcript for one source, served from the cache when present.
    ///
    /// Freshly acquired transcripts are cached unless they are error text.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn transcript(&self, source: &SourceRef) -> Result<TranscriptOutcome> {
        let key = source.cache_key().await?;

        match self.cache.lookup(&key).await {
            Ok(Some(text)) => {
                info!("Using cached transcript for {}", key);
                return Ok(TranscriptOutcome {
                    text,
                    origin: None,
                    warnings: Vec::new(),
                });
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for {}: {}", key, e),
        }

        let acquired = self.acquirer.acquire(source).await?;
        if let Err(e) = self.cache.store(&key, &acquired.transcript).await {
            warn!("Failed to cache transcript for {}: {}", key, e);
        }

        Ok(TranscriptOutcome {
            text: acquired.transcript,
            origin: Some(acquired.origin),
            warnings: acquired.warnings,
        })
    }

    /// Run one submission: index the given sources, then answer `question`.
    ///
    /// A failing source becomes a warning and the rest continue. With sources given
    /// but no usable transcript, the submission stops with a warning and nothing is
    /// embedded. If the index build fails, the previously published snapshot is
    /// not consulted and the answer is [`NO_DATA_ANSWER`]. With no sources, the
    /// question is answered from the current index.
    #[instrument(skip(self, sources), fields(sources = sources.len()))]
    pub async fn submit(&mut self, question: &str, sources: &[SourceRef], top_k: usize) -> Result<SubmissionResult> {
        let mut result = SubmissionResult::default();

        if !sources.is_empty() {
            let mut chunks = Vec::new();

            for source in sources {
                match self.transcript(source).await {
                    Ok(outcome) => {
                        result.warnings.extend(outcome.warnings);
                        let produced = self.chunker.chunk(&outcome.text);
                        info!("{} produced {} chunks", source.label(), produced.len());
                        if !produced.is_empty() {
                            result.sources_processed += 1;
                        }
                        chunks.extend(produced);
                    }
                    Err(e) => {
                        warn!(source = %source, "Skipping source: {}", e);
                        result.warnings.push(format!("Skipped {}: {}", source.label(), e));
                    }
                }
            }

            if chunks.is_empty() {
                result.warnings.push(NO_TRANSCRIPTS_WARNING.to_string());
                return Ok(result);
            }

            match self.store.build(&chunks).await {
                Ok(snapshot) => result.chunks_indexed = snapshot.len(),
                Err(e) => {
                    error!(stage = "index", "Index build failed: {}", e);
                    result.warnings.push(format!("Could not index the sources: {}", e));
                    let answer = Answer {
                        text: NO_DATA_ANSWER.to_string(),
                        sources: Vec::new(),
                    };
                    self.record(question, &answer);
                    result.answer = Some(answer);
                    return Ok(result);
                }
            }
        }

        match self.engine.ask(question, top_k).await {
            Ok(answer) => {
                self.record(question, &answer);
                result.answer = Some(answer);
            }
            Err(e) => {
                error!(stage = "answer", "{}", e);
                result.warnings.push(format!("Could not answer the question: {}", e));
            }
        }

        Ok(result)
    }

    fn record(&mut self, question: &str, answer: &Answer) {
        self.history.push(QaRecord {
            question: question.to_string(),
            answer: answer.text.clone(),
            asked_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquirer::tests::{FakeCaptions, FakeExtractor, FakeSpeech};
    use crate::embedding::testing::BagOfWordsEmbedder;
    use crate::transcription::CaptionError;
    use std::path::Path;
    use std::sync::atomic::Ordering;

    struct Fakes {
        captions: Arc<FakeCaptions>,
        extractor: Arc<FakeExtractor>,
        speech: Arc<FakeSpeech>,
        embedder: Arc<BagOfWordsEmbedder>,
    }

    fn settings(dir: &Path, endpoint: &str) -> Settings {
        let mut settings = Settings::default();
        settings.general.cache_dir = dir.join("cache").to_string_lossy().to_string();
        settings.general.temp_audio_dir = dir.join("audio").to_string_lossy().to_string();
        settings.answer.endpoint = endpoint.to_string();
        settings.answer.api_token = None;
        settings
    }

    fn orchestrator(settings: Settings, fakes: &Fakes) -> Orchestrator {
        Orchestrator::with_components(
            settings,
            Prompts::default(),
            fakes.captions.clone(),
            fakes.extractor.clone(),
            Component::ready(fakes.speech.clone() as Arc<dyn SpeechToText>),
            Component::ready(fakes.embedder.clone() as Arc<dyn Embedder>),
        )
        .unwrap()
    }

    fn fakes(captions: FakeCaptions, extract_ok: bool, speech: FakeSpeech) -> Fakes {
        Fakes {
            captions: Arc::new(captions),
            extractor: Arc::new(FakeExtractor::new(extract_ok)),
            speech: Arc::new(speech),
            embedder: Arc::new(BagOfWordsEmbedder::default()),
        }
    }

    const TALK: &str = "Ownership is the core idea of Rust. Every value has a single owner. When the owner goes out of scope the value is dropped.";

    #[tokio::test]
    async fn test_second_acquisition_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let fakes = fakes(FakeCaptions::with(&[("en", Ok(TALK))]), true, FakeSpeech::with(&[]));
        let orch = orchestrator(settings(dir.path(), "http://127.0.0.1:9"), &fakes);
        let source = SourceRef::video("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();

        let first = orch.transcript(&source).await.unwrap();
        let second = orch.transcript(&source).await.unwrap();

        assert!(!first.from_cache());
        assert!(second.from_cache());
        assert_eq!(first.text, second.text);
        assert_eq!(fakes.captions.call_count(), 1);
        assert_eq!(fakes.extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_only_source_warns_and_skips_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let fakes = fakes(
            FakeCaptions::with(&[("en", Err(CaptionError::Disabled))]),
            false,
            FakeSpeech::with(&[]),
        );
        let mut orch = orchestrator(settings(dir.path(), "http://127.0.0.1:9"), &fakes);
        let source = SourceRef::video("https://www.youtube.com/watch?v=abc123").unwrap();

        let result = orch.submit("What is it about?", &[source], 5).await.unwrap();

        assert!(result.answer.is_none());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("Audio extraction failed"));
        assert_eq!(result.warnings[1], NO_TRANSCRIPTS_WARNING);
        assert_eq!(fakes.embedder.call_count(), 0);
        assert!(orch.history().is_empty());
    }

    #[tokio::test]
    async fn test_no_index_answers_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;

        let fakes = fakes(FakeCaptions::with(&[]), true, FakeSpeech::with(&[]));
        let mut settings = settings(dir.path(), &server.url());
        settings.answer.api_token = Some("hf_test".to_string());
        let mut orch = orchestrator(settings, &fakes);

        let result = orch.submit("Anything indexed?", &[], 5).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.answer.unwrap().text, NO_DATA_ANSWER);
        assert_eq!(fakes.embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_still_completes_submission() {
        let dir = tempfile::tempdir().unwrap();
        let fakes = fakes(FakeCaptions::with(&[("en", Ok(TALK))]), true, FakeSpeech::with(&[]));
        let mut orch = orchestrator(settings(dir.path(), "http://127.0.0.1:9"), &fakes);
        let source = SourceRef::video("https://youtu.be/dQw4w9WgXcQ").unwrap();

        let result = orch.submit("Who owns a value?", &[source], 5).await.unwrap();

        let answer = result.answer.unwrap();
        assert!(answer.text.starts_with("[ERROR]"));
        assert_eq!(result.sources_processed, 1);
        assert_eq!(result.chunks_indexed, 1);
        assert_eq!(orch.history().len(), 1);
        assert_eq!(orch.history()[0].answer, answer.text);
    }

    #[tokio::test]
    async fn test_failed_build_does_not_answer_from_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let fakes = fakes(FakeCaptions::with(&[("en", Ok(TALK))]), true, FakeSpeech::with(&[]));
        let mut orch = orchestrator(settings(dir.path(), "http://127.0.0.1:9"), &fakes);

        let old = SourceRef::video("https://www.youtube.com/watch?v=oldvideo01").unwrap();
        let first = orch.submit("Who owns a value?", &[old], 5).await.unwrap();
        assert_eq!(first.chunks_indexed, 1);

        fakes.embedder.failing.store(true, Ordering::SeqCst);
        let new = SourceRef::video("https://www.youtube.com/watch?v=newvideo02").unwrap();
        let result = orch.submit("What do penguins eat?", &[new], 5).await.unwrap();

        assert_eq!(result.chunks_indexed, 0);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Could not index the sources:")));
        let answer = result.answer.unwrap();
        assert_eq!(answer.text, NO_DATA_ANSWER);
        assert!(answer.sources.is_empty());
        assert_eq!(orch.history().last().unwrap().answer, NO_DATA_ANSWER);
        assert_eq!(orch.store().load().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_source_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let fakes = fakes(FakeCaptions::with(&[("en", Ok(TALK))]), true, FakeSpeech::with(&[]));
        let mut orch = orchestrator(settings(dir.path(), "http://127.0.0.1:9"), &fakes);

        let missing = SourceRef::audio(dir.path().join("missing.mp3"));
        let good = SourceRef::video("https://www.youtube.com/watch?v=abc123").unwrap();

        let result = orch.submit("What is dropped?", &[missing, good], 3).await.unwrap();

        assert_eq!(result.sources_processed, 1);
        assert!(result.warnings.iter().any(|w| w.starts_with("Skipped")));
        assert!(result.answer.is_some());
        assert_eq!(fakes.embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn test_error_text_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fakes = fakes(FakeCaptions::with(&[]), true, FakeSpeech::with(&[]));
        let orch = orchestrator(settings(dir.path(), "http://127.0.0.1:9"), &fakes);

        let stored = orch.cache.store("abc123", "[ERROR] transcript failed").await.unwrap();
        assert!(!stored);
        assert_eq!(orch.cache.lookup("abc123").await.unwrap(), None);
    }
}
