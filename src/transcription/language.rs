//! Dominant-language detection and transcript tagging.

use whatlang::{Detector, Lang};

/// Language assumed when detection fails or finds an unmapped language.
pub const DEFAULT_LANGUAGE: &str = "english";

/// Languages the detector chooses from, with their display names.
const LANGUAGES: &[(Lang, &str)] = &[
    (Lang::Eng, "english"),
    (Lang::Hin, "hindi"),
    (Lang::Spa, "spanish"),
    (Lang::Fra, "french"),
    (Lang::Deu, "german"),
    (Lang::Ita, "italian"),
    (Lang::Rus, "russian"),
    (Lang::Cmn, "chinese"),
    (Lang::Jpn, "japanese"),
    (Lang::Ara, "arabic"),
];

/// Detect the dominant language of `text`. Best effort: an unreliable guess
/// counts as a failed detection and falls back to english.
pub fn detect_language(text: &str) -> &'static str {
    let detector = Detector::with_allowlist(LANGUAGES.iter().map(|(lang, _)| *lang).collect());

    match detector.detect(text) {
        Some(info) if info.is_reliable() => LANGUAGES
            .iter()
            .find(|(l, _)| *l == info.lang())
            .map(|(_, name)| *name)
            .unwrap_or(DEFAULT_LANGUAGE),
        Some(info) => {
            tracing::debug!(
                guess = info.lang().eng_name(),
                confidence = info.confidence(),
                "Unreliable language guess, assuming {}",
                DEFAULT_LANGUAGE
            );
            DEFAULT_LANGUAGE
        }
        None => {
            tracing::debug!("Language detection failed, assuming {}", DEFAULT_LANGUAGE);
            DEFAULT_LANGUAGE
        }
    }
}

/// Prefix a transcript with its language tag, e.g. `[HINDI TRANSCRIPT]`.
pub fn tag_transcript(language: &str, text: &str) -> String {
    format!("[{} TRANSCRIPT]\n{}", language.to_uppercase(), text)
}

/// Detect the language of `text` and tag it.
pub fn detect_and_tag(text: &str) -> String {
    tag_transcript(detect_language(text), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let text = "Today we are going to talk about how the borrow checker keeps your programs safe from data races.";
        assert_eq!(detect_language(text), "english");
    }

    #[test]
    fn test_detects_hindi() {
        let text = "नमस्ते दोस्तों, आज हम इस वीडियो में बात करेंगे कि प्रोग्रामिंग कैसे सीखें और यह क्यों ज़रूरी है।";
        assert_eq!(detect_language(text), "hindi");
    }

    #[test]
    fn test_short_english_is_not_mistagged() {
        assert_eq!(
            detect_language("So today we talk about Rust. It is fast! Is it safe? Yes."),
            "english"
        );
        assert_eq!(
            detect_and_tag("Old video about Rust ownership."),
            "[ENGLISH TRANSCRIPT]\nOld video about Rust ownership."
        );
    }

    #[test]
    fn test_empty_text_defaults_to_english() {
        assert_eq!(detect_language(""), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_tag_format() {
        assert_eq!(tag_transcript("hindi", "text"), "[HINDI TRANSCRIPT]\ntext");
    }
}
