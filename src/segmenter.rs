//! Sentence segmentation and small text helpers shared by the pipelines.
//!
//! Sentence boundaries follow the Unicode text segmentation rules (UAX #29),
//! so abbreviations and non-Latin punctuation are handled without a trained
//! tokenizer.

use unicode_segmentation::UnicodeSegmentation;

/// Split text into trimmed sentences, in document order.
///
/// Empty or whitespace-only input yields no sentences. Text that has
/// content but no recognisable sentence (e.g. only punctuation) comes back
/// whole as a single sentence.
pub fn segment(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let sentences: Vec<String> = trimmed
        .unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if sentences.is_empty() {
        vec![trimmed.to_string()]
    } else {
        sentences
    }
}

/// Find the first sentence of `text` that contains `answer` verbatim.
///
/// Used to back up an extractive answer with the sentence it came from.
pub fn justify(answer: &str, text: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    segment(text).into_iter().find(|s| s.contains(answer))
}

/// Keep at most `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
