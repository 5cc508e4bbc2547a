//! Sentence-aware transcript chunking.
//!
//! Transcripts are split into sentences at `.`, `!` or `?` followed by whitespace,
//! then packed into chunks of at most `max_words` words. A sentence that is longer
//! than `max_words` on its own is hard-split into consecutive `max_words` slices.
//!
//! Every input word lands in exactly one chunk, in the original order, and no
//! chunk is empty.

/// Default maximum number of words per chunk.
pub const DEFAULT_MAX_WORDS: usize = 2000;

/// Splits transcripts into bounded, sentence-respecting passages.
#[derive(Debug, Clone, Copy)]
pub struct SentenceChunker {
    max_words: usize,
}

impl SentenceChunker {
    /// Create a chunker. A limit of zero is treated as one word per chunk.
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words: max_words.max(1),
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Split text into chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let max = self.max_words;
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for sentence in split_sentences(text) {
            if current.len() + sentence.len() <= max {
                current.extend(sentence);
                continue;
            }

            if !current.is_empty() {
                chunks.push(current.join(" "));
            }

            let mut words = sentence.as_slice();
            while words.len() > max {
                chunks.push(words[..max].join(" "));
                words = &words[max..];
            }
            current = words.to_vec();
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        chunks
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

/// Split text into chunks of at most `max_words` words.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<String> {
    SentenceChunker::new(max_words).chunk(text)
}

/// Split text into sentences, each a non-empty list of words.
///
/// A word ending in sentence punctuation closes the sentence, which is the same
/// as splitting at punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<Vec<&str>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    fn assert_invariants(text: &str, max: usize) {
        let chunks = chunk_text(text, max);
        let rejoined = chunks.join(" ");
        assert_eq!(words(&rejoined), words(text), "word sequence must be preserved");
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty());
            assert!(words(chunk).len() <= max.max(1), "chunk over limit: {:?}", chunk);
        }
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("Hi there. How are you?  Fine!\nGood");
        assert_eq!(
            sentences,
            vec![
                vec!["Hi", "there."],
                vec!["How", "are", "you?"],
                vec!["Fine!"],
                vec!["Good"],
            ]
        );
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("One sentence. Another one.", 2000);
        assert_eq!(chunks, vec!["One sentence. Another one."]);
    }

    #[test]
    fn test_sentences_are_not_split_across_chunks() {
        let chunks = chunk_text("a b c. d e f. g h.", 6);
        assert_eq!(chunks, vec!["a b c. d e f.", "g h."]);
    }

    #[test]
    fn test_long_sentence_is_hard_split() {
        let chunks = chunk_text("w1 w2 w3 w4 w5 w6 w7. tail.", 3);
        assert_eq!(chunks, vec!["w1 w2 w3", "w4 w5 w6", "w7. tail."]);
    }

    #[test]
    fn test_exact_multiple_of_limit() {
        let chunks = chunk_text("start. a b c d e f", 3);
        assert_eq!(chunks, vec!["start.", "a b c", "d e f"]);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(chunk_text("", 10).is_empty());
        assert!(chunk_text("   \n\t ", 10).is_empty());
    }

    #[test]
    fn test_zero_limit_still_terminates() {
        let chunks = chunk_text("a b. c", 0);
        assert_eq!(chunks, vec!["a", "b.", "c"]);
    }

    #[test]
    fn test_invariants_over_varied_inputs() {
        let long_sentence = (0..57).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let texts = [
            "[ENGLISH TRANSCRIPT]\nSo today we talk about Rust. It is fast! Is it safe? Yes.".to_string(),
            format!("Intro. {} End.", long_sentence),
            "no punctuation at all just a stream of words from auto captions".to_string(),
            "Dr. Smith went to Washington. He said: \"hello...\" and left?".to_string(),
        ];

        for text in &texts {
            for max in [1, 2, 3, 5, 8, 13, 2000] {
                assert_invariants(text, max);
            }
        }
    }
}
