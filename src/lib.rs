//! Svar - Questions answered from spoken content
//!
//! A CLI tool that answers natural-language questions about YouTube videos and
//! audio recordings, grounded in what was actually said.
//!
//! The name "Svar" is the Norwegian word for "answer."
//!
//! # Overview
//!
//! For each question, Svar:
//! - Gets a transcript per source: captions in the preferred or secondary
//!   language, else extracted audio through Whisper at decreasing model sizes
//! - Caches transcripts by video ID or by a hash of the uploaded file
//! - Splits transcripts into sentence-respecting passages
//! - Embeds the passages and publishes an exact L2 index snapshot
//! - Retrieves the closest passages and asks a hosted model for an answer
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `audio_source` - Source references and cache keys
//! - `audio` - Audio extraction and duration probing
//! - `transcription` - Captions, speech-to-text and language tagging
//! - `acquirer` - Transcript fallback policy
//! - `cache` - Transcript cache
//! - `chunking` - Sentence chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Exact index and persisted snapshots
//! - `rag` - Answer generation
//! - `orchestrator` - Submission pipeline and session history
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::audio_source::SourceRef;
//! use svar::config::Settings;
//! use svar::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut orchestrator = Orchestrator::new(settings).await?;
//!
//!     let source = SourceRef::video("https://www.youtube.com/watch?v=dQw4w9WgXcQ")?;
//!     let result = orchestrator.submit("What is the song about?", &[source], 5).await?;
//!     if let Some(answer) = result.answer {
//!         println!("{}", answer.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod acquirer;
pub mod audio;
pub mod audio_source;
pub mod cache;
pub mod chunking;
pub mod cli;
pub mod component;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod transcription;
pub mod vector_store;

pub use error::{Result, SvarError};
