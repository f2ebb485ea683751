//! Parsing generated question lists.
//!
//! Local generation goes through two stages: enumerated lines first, then a
//! question-mark split when no enumerated line survives. The outcome records
//! which stage produced the questions so callers (and tests) can tell them
//! apart. An empty outcome is a valid result, not an error.

/// Outcome of parsing generated text into quiz questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionParse {
    /// Questions taken from lines starting with a list marker (`1.`, `2)` ...).
    Numbered(Vec<String>),
    /// No enumerated line was found; questions came from the `?` split.
    Fallback(Vec<String>),
    /// Neither stage produced anything.
    Empty,
}

impl QuestionParse {
    /// Run both stages over `output`.
    pub fn parse(output: &str, min_fragment_chars: usize) -> Self {
        let numbered = numbered_lines(output);
        if !numbered.is_empty() {
            return QuestionParse::Numbered(numbered);
        }

        let fragments = question_mark_fragments(output, min_fragment_chars);
        if fragments.is_empty() {
            QuestionParse::Empty
        } else {
            QuestionParse::Fallback(fragments)
        }
    }

    /// Keep at most `count` questions. Drops to [`QuestionParse::Empty`] when
    /// nothing is left.
    pub fn truncate(self, count: usize) -> Self {
        let rebuild = |mut qs: Vec<String>, ctor: fn(Vec<String>) -> Self| {
            qs.truncate(count);
            if qs.is_empty() { QuestionParse::Empty } else { ctor(qs) }
        };

        match self {
            QuestionParse::Numbered(qs) => rebuild(qs, QuestionParse::Numbered),
            QuestionParse::Fallback(qs) => rebuild(qs, QuestionParse::Fallback),
            QuestionParse::Empty => QuestionParse::Empty,
        }
    }

    /// The parsed questions, in output order.
    pub fn questions(&self) -> &[String] {
        match self {
            QuestionParse::Numbered(qs) | QuestionParse::Fallback(qs) => qs,
            QuestionParse::Empty => &[],
        }
    }

    pub fn into_questions(self) -> Vec<String> {
        match self {
            QuestionParse::Numbered(qs) | QuestionParse::Fallback(qs) => qs,
            QuestionParse::Empty => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions().is_empty()
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, QuestionParse::Fallback(_))
    }
}

/// Stage one: lines beginning with a digit, list marker stripped.
pub fn numbered_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
        .map(strip_marker)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stage two: split on `?` and keep fragments longer than `min_chars`,
/// each restored with its question mark.
pub fn question_mark_fragments(output: &str, min_chars: usize) -> Vec<String> {
    output
        .split('?')
        .map(|fragment| strip_marker(fragment.trim()))
        .filter(|fragment| fragment.chars().count() > min_chars)
        .map(|fragment| format!("{}?", fragment))
        .collect()
}

/// Remove a leading list marker (`12.`, `3)`, `4:`) and surrounding space.
/// Digits not followed by a marker character are content and stay.
fn strip_marker(text: &str) -> &str {
    let text = text.trim();
    let rest = text.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == text.len() {
        return text;
    }
    match rest.strip_prefix(['.', ')', ':']) {
        Some(after) => after.trim(),
        None => text,
    }
}

/// Parse a hosted model's numbered list: every line containing a period is
/// split on its first period and the remainder kept.
pub fn remote_questions(output: &str) -> Vec<String> {
    output
        .trim()
        .lines()
        .filter_map(|line| line.split_once('.'))
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_lines_drop_trailing_text() {
        let output = "1. What is photosynthesis?\n2. Why is water essential?\nRandom trailing text";
        let parsed = QuestionParse::parse(output, 10);
        assert_eq!(
            parsed,
            QuestionParse::Numbered(vec![
                "What is photosynthesis?".to_string(),
                "Why is water essential?".to_string(),
            ])
        );
        assert!(!parsed.used_fallback());
    }

    #[test]
    fn test_numbered_lines_accept_other_markers() {
        let lines = numbered_lines("  3) How does it work?\n4: Who found it?\n5.\n");
        assert_eq!(lines, vec!["How does it work?", "Who found it?"]);
    }

    #[test]
    fn test_fallback_splits_on_question_marks() {
        let output = "What causes the tides? Why? How is the moon involved";
        let parsed = QuestionParse::parse(output, 10);
        assert_eq!(
            parsed,
            QuestionParse::Fallback(vec![
                "What causes the tides?".to_string(),
                "How is the moon involved?".to_string(),
            ])
        );
        assert!(parsed.used_fallback());
    }

    #[test]
    fn test_fallback_strips_list_markers() {
        let fragments = question_mark_fragments("1.\nWhat is the first idea here? tiny", 10);
        assert_eq!(fragments, vec!["What is the first idea here?"]);
    }

    #[test]
    fn test_leading_numbers_without_marker_are_kept() {
        assert_eq!(
            numbered_lines("2008 crisis: why did it happen?\n1. What came next?"),
            vec!["2008 crisis: why did it happen?", "What came next?"]
        );
        assert_eq!(
            question_mark_fragments("1990 saw which treaty signed? 2. Who led the talks", 10),
            vec!["1990 saw which treaty signed?", "Who led the talks?"]
        );
    }

    #[test]
    fn test_nothing_parsable_is_empty() {
        assert_eq!(QuestionParse::parse("", 10), QuestionParse::Empty);
        assert_eq!(QuestionParse::parse("short? tiny?", 10), QuestionParse::Empty);
    }

    #[test]
    fn test_truncate() {
        let parsed = QuestionParse::Numbered(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(parsed.truncate(3).len(), 3);

        let parsed = QuestionParse::Fallback(vec!["a".into()]);
        assert_eq!(parsed.truncate(0), QuestionParse::Empty);
    }

    #[test]
    fn test_remote_questions() {
        let output = "\n1. What is the main claim?\n2. How is it supported?\nThat is all\n3.   Why does it matter?  \n";
        assert_eq!(
            remote_questions(output),
            vec![
                "What is the main claim?",
                "How is it supported?",
                "Why does it matter?"
            ]
        );
    }

    #[test]
    fn test_remote_questions_keeps_text_after_first_period_only() {
        assert_eq!(
            remote_questions("1. Who wrote vol. 2?"),
            vec!["Who wrote vol. 2?"]
        );
    }
}
