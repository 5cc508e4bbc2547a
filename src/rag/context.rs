//! Context formatting for answer prompts.

use crate::vector_store::SearchResult;

/// Join retrieved chunks in ranking order, separated by a blank line.
pub fn format_context_for_prompt(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(position: usize, chunk: &str, distance: f32) -> SearchResult {
        SearchResult {
            position,
            chunk: chunk.to_string(),
            distance,
        }
    }

    #[test]
    fn test_prompt_context_keeps_ranking_order() {
        let results = vec![result(4, "Closest chunk.", 0.1), result(0, " Second chunk. ", 0.5)];
        assert_eq!(format_context_for_prompt(&results), "Closest chunk.\n\nSecond chunk.");
    }
}
