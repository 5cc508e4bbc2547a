//! CLI module for Svar.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::audio_source::{is_media_file, SourceRef};
use clap::{Parser, Subcommand};
use std::path::Path;

/// Svar - ask questions about videos and recordings
///
/// Fetches or transcribes the spoken content of YouTube videos and audio files,
/// indexes it, and answers questions grounded in what was said.
/// "Svar" is Norwegian for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Index the given sources and answer one question
    Ask {
        /// The question to ask
        question: String,

        /// YouTube video URL (repeatable)
        #[arg(short, long = "url")]
        urls: Vec<String>,

        /// Audio or video file to transcribe
        #[arg(short, long)]
        audio: Option<String>,

        /// Number of passages used as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Start an interactive question session over the given sources
    Chat {
        /// YouTube video URL (repeatable)
        #[arg(short, long = "url")]
        urls: Vec<String>,

        /// Audio or video file to transcribe
        #[arg(short, long)]
        audio: Option<String>,

        /// Number of passages used as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Print the transcript of one video or audio file
    Transcript {
        /// YouTube URL/ID, or local audio/video file path
        input: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Turn URL arguments and an optional audio path into sources.
///
/// Blank entries are ignored. Entries that cannot be used are returned as
/// warnings so the remaining sources still run.
pub fn collect_sources(urls: &[String], audio: Option<&str>) -> (Vec<SourceRef>, Vec<String>) {
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        match SourceRef::video(url) {
            Ok(source) => sources.push(source),
            Err(e) => warnings.push(format!("Skipped {}: {}", url, e)),
        }
    }

    if let Some(path) = audio.map(str::trim).filter(|p| !p.is_empty()) {
        let path = Path::new(path);
        if !path.is_file() {
            warnings.push(format!("Skipped {}: file not found", path.display()));
        } else if !is_media_file(path) {
            warnings.push(format!("Skipped {}: not an audio or video file", path.display()));
        } else {
            sources.push(SourceRef::audio(path));
        }
    }

    (sources, warnings)
}
