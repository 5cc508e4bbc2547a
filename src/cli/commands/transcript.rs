//! Transcript command - print the transcript of one source.

use crate::acquirer::TranscriptOrigin;
use crate::audio_source::SourceRef;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Acquire (through the cache) and print one transcript.
pub async fn run_transcript(input: &str, settings: Settings) -> Result<()> {
    let source = SourceRef::parse(input)?;
    let orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(&format!("Getting transcript for {}...", source.label()));
    let result = orchestrator.transcript(&source).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            Output::error(&format!("Failed to get transcript: {}", e));
            return Err(e.into());
        }
    };

    for warning in &outcome.warnings {
        Output::warning(warning);
    }

    let origin = match &outcome.origin {
        None => "cache".to_string(),
        Some(TranscriptOrigin::Captions { language }) => format!("{} captions", language),
        Some(TranscriptOrigin::SpeechToText { model }) => format!("whisper ({})", model),
    };
    Output::status(&format!("Transcript from {}", origin));

    println!("{}", outcome.text);
    Ok(())
}
