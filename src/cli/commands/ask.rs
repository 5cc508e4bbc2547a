//! Ask command implementation.

use crate::audio_source::{SourceRef, SourceType};
use crate::cli::preflight::{self, Operation};
use crate::cli::{collect_sources, Output};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, SubmissionResult};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    urls: &[String],
    audio: Option<&str>,
    top_k: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let (sources, warnings) = collect_sources(urls, audio);
    for warning in &warnings {
        Output::warning(warning);
    }
    report_preflight(&sources, &settings);

    let top_k = top_k.unwrap_or(settings.answer.top_k);
    let mut orchestrator = Orchestrator::new(settings).await?;

    let spinner = Output::spinner(if sources.is_empty() {
        "Searching the current index..."
    } else {
        "Processing sources and generating answer..."
    });
    let result = orchestrator.submit(question, &sources, top_k).await;
    spinner.finish_and_clear();

    print_submission(&result?, true);
    Ok(())
}

/// Print pre-flight problems for the given sources as warnings.
pub(crate) fn report_preflight(sources: &[SourceRef], settings: &Settings) {
    let mut operations = vec![Operation::Answer];
    if sources.iter().any(|s| s.source_type() == SourceType::YouTube) {
        operations.push(Operation::Video);
    }
    if sources.iter().any(|s| s.source_type() == SourceType::Local) {
        operations.push(Operation::Upload);
    }

    let mut found = false;
    for operation in operations {
        if let Err(problems) = preflight::check(operation, settings) {
            for problem in problems {
                Output::warning(&problem.to_string());
                found = true;
            }
        }
    }
    if found {
        Output::info("Run 'svar doctor' for detailed diagnostics.");
    }
}

/// Print warnings, the answer and optionally the passages it used.
pub(crate) fn print_submission(result: &SubmissionResult, show_sources: bool) {
    for warning in &result.warnings {
        Output::warning(warning);
    }

    if result.chunks_indexed > 0 {
        Output::kv("Sources processed", &result.sources_processed.to_string());
        Output::kv("Passages indexed", &result.chunks_indexed.to_string());
    }

    let Some(answer) = &result.answer else {
        return;
    };

    if answer.is_error() {
        Output::error(&answer.text);
    } else {
        println!("\n{}\n", answer.text);
    }

    if show_sources && !answer.sources.is_empty() {
        Output::header("Passages");
        for (rank, source) in answer.sources.iter().enumerate() {
            Output::source_result(rank + 1, source);
        }
        println!();
    }
}
