//! Interactive question session.

use super::ask::{print_submission, report_preflight};
use crate::cli::{collect_sources, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
///
/// Sources are indexed with the first question; later questions reuse that index.
pub async fn run_chat(urls: &[String], audio: Option<&str>, top_k: Option<usize>, settings: Settings) -> Result<()> {
    let (mut pending, warnings) = collect_sources(urls, audio);
    for warning in &warnings {
        Output::warning(warning);
    }
    report_preflight(&pending, &settings);

    let top_k = top_k.unwrap_or(settings.answer.top_k);
    let mut orchestrator = Orchestrator::new(settings).await?;

    println!("\n{}", style("Svar Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, 'history' to list answers so far, or 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("history") {
            if orchestrator.history().is_empty() {
                Output::info("No questions answered yet.");
            }
            for (i, record) in orchestrator.history().iter().enumerate() {
                Output::qa_record(i + 1, record);
            }
            println!();
            continue;
        }

        let spinner = Output::spinner(if pending.is_empty() {
            "Thinking..."
        } else {
            "Processing sources..."
        });
        let result = orchestrator.submit(input, &pending, top_k).await;
        spinner.finish_and_clear();
        pending.clear();

        match result {
            Ok(result) => print_submission(&result, false),
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Ok(())
}
