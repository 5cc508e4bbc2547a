//! CLI output formatting utilities.

use crate::orchestrator::QaRecord;
use crate::vector_store::SearchResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a status line on stderr, keeping stdout for content.
    pub fn status(msg: &str) {
        eprintln!("{} {}", style(">>").dim(), style(msg).dim());
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a retrieved passage.
    pub fn source_result(rank: usize, result: &SearchResult) {
        println!(
            "\n{} passage #{} (distance: {:.3})",
            style(format!("[{}]", rank)).green(),
            style(result.position).bold(),
            result.distance
        );
        println!("   {}", content_preview(&result.chunk, 200));
    }

    /// Print one question/answer pair from the session history.
    pub fn qa_record(index: usize, record: &QaRecord) {
        println!(
            "\n{} {} {}",
            style(format!("Q{}:", index)).green().bold(),
            record.question,
            style(record.asked_at.format("(%H:%M:%S)").to_string()).dim()
        );
        println!("{} {}", style(format!("A{}:", index)).cyan().bold(), record.answer);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten and truncate content with an ellipsis.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short\ntext", 20), "short text");
        assert_eq!(content_preview("abcdef", 3), "abc...");
        assert_eq!(content_preview("नमस्ते दुनिया", 3), "नमस...");
    }
}
