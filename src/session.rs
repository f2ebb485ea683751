//! In-memory session state: the active document and everything derived
//! from it.
//!
//! The session owns its artifacts and enforces their invariants: a summary
//! is tied to the document it was made from, quiz questions and answers
//! always have the same length, and the Q&A log only ever grows.

use crate::error::{AssistantError, Result};
use crate::segmenter::word_count;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Opaque identity of a loaded document within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

/// Immutable document text, identified by its source name.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    name: String,
    text: String,
}

impl Document {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }
}

/// A summary and the document it belongs to.
#[derive(Debug, Clone)]
pub struct Summary {
    document: DocumentId,
    text: String,
}

impl Summary {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Generated questions paired by index with the user's answers.
#[derive(Debug, Clone, Default)]
pub struct Quiz {
    questions: Vec<String>,
    answers: Vec<String>,
}

impl Quiz {
    /// A fresh quiz with one empty answer per question.
    pub fn new(questions: Vec<String>) -> Self {
        let answers = vec![String::new(); questions.len()];
        Self { questions, answers }
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, index: usize) -> Result<&str> {
        self.questions
            .get(index)
            .map(String::as_str)
            .ok_or(AssistantError::QuestionIndex(index))
    }

    pub fn set_answer(&mut self, index: usize, answer: impl Into<String>) -> Result<()> {
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(AssistantError::QuestionIndex(index))?;
        *slot = answer.into();
        Ok(())
    }
}

/// One question asked about the document and the answer given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QnaLogEntry {
    pub question: String,
    pub answer: String,
}

impl QnaLogEntry {
    /// Transcript form: `Q: ...\nA: ...\n\n`.
    pub fn render(&self) -> String {
        format!("Q: {}\nA: {}\n\n", self.question, self.answer)
    }
}

/// Which artifact to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
    Document,
    Summary,
    Quiz,
    Transcript,
}

impl Export {
    pub const ALL: [Export; 4] = [Export::Document, Export::Summary, Export::Quiz, Export::Transcript];

    pub fn default_filename(self) -> &'static str {
        match self {
            Export::Document => "document.txt",
            Export::Summary => "summary.txt",
            Export::Quiz => "quiz.txt",
            Export::Transcript => "qna_history.txt",
        }
    }
}

/// Result of offering a document to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentChange {
    /// A different document replaced the active one (or none was loaded).
    Replaced,
    /// The same source name was offered again; nothing changed.
    Unchanged,
}

/// Counters shown alongside the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub questions_asked: usize,
    pub document_words: usize,
    pub summary_words: usize,
    pub quiz_questions: usize,
}

/// State for one user session. Lifetime is managed by the caller.
#[derive(Debug, Default)]
pub struct Session {
    document: Option<Document>,
    summary: Option<Summary>,
    quiz: Quiz,
    qna_log: Vec<QnaLogEntry>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The active document, or [`AssistantError::NoDocument`].
    pub fn require_document(&self) -> Result<&Document> {
        self.document.as_ref().ok_or(AssistantError::NoDocument)
    }

    /// Offer a document. A new source name replaces the document wholesale
    /// and drops the summary and quiz derived from the old one.
    pub fn load_document(&mut self, name: impl Into<String>, text: String) -> DocumentChange {
        let name = name.into();
        if self.document.as_ref().is_some_and(|doc| doc.name == name) {
            return DocumentChange::Unchanged;
        }

        self.next_id += 1;
        self.document = Some(Document {
            id: DocumentId(self.next_id),
            name,
            text,
        });
        self.summary = None;
        self.quiz = Quiz::default();
        DocumentChange::Replaced
    }

    /// Summary of the active document, if one has been generated for it.
    /// A summary of any earlier document is never returned.
    pub fn summary(&self) -> Option<&str> {
        let current = self.document.as_ref()?.id;
        self.summary
            .as_ref()
            .filter(|s| s.document == current)
            .map(Summary::text)
    }

    /// Store a summary for `document`. Ignored if that document is no
    /// longer active.
    pub fn set_summary(&mut self, document: DocumentId, text: String) -> bool {
        if self.document.as_ref().map(Document::id) != Some(document) {
            return false;
        }
        self.summary = Some(Summary { document, text });
        true
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Replace questions and answers together.
    pub fn replace_quiz(&mut self, questions: Vec<String>) {
        self.quiz = Quiz::new(questions);
    }

    pub fn set_quiz_answer(&mut self, index: usize, answer: impl Into<String>) -> Result<()> {
        self.quiz.set_answer(index, answer)
    }

    pub fn qna_log(&self) -> &[QnaLogEntry] {
        &self.qna_log
    }

    pub fn log_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.qna_log.push(QnaLogEntry {
            question: question.into(),
            answer: answer.into(),
        });
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            questions_asked: self.qna_log.len(),
            document_words: self.document.as_ref().map_or(0, Document::word_count),
            summary_words: self.summary().map_or(0, word_count),
            quiz_questions: self.quiz.len(),
        }
    }

    /// Full Q&A transcript, entries joined by a newline.
    pub fn transcript(&self) -> String {
        self.qna_log
            .iter()
            .map(QnaLogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain-text rendering of one artifact. Missing artifacts render empty.
    pub fn export(&self, which: Export) -> String {
        match which {
            Export::Document => self
                .document
                .as_ref()
                .map(|d| d.text.clone())
                .unwrap_or_default(),
            Export::Summary => self.summary().unwrap_or_default().to_string(),
            Export::Quiz => {
                let mut out = String::new();
                for (i, (q, a)) in self.quiz.questions.iter().zip(&self.quiz.answers).enumerate() {
                    let _ = write!(out, "Question {}: {}\nYour answer: {}\n\n", i + 1, q, a);
                }
                out
            }
            Export::Transcript => self.transcript(),
        }
    }

    /// Write one artifact into `dir` under its default filename.
    pub fn export_to_dir(&self, which: Export, dir: &Path) -> Result<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| AssistantError::io(dir, e))?;
        }
        let path = dir.join(which.default_filename());
        fs::write(&path, self.export(which)).map_err(|e| AssistantError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_document_invalidates_summary_and_quiz() {
        let mut session = Session::new();
        session.load_document("a.txt", "First document.".to_string());
        let first = session.require_document().unwrap().id();
        assert!(session.set_summary(first, "About the first.".to_string()));
        session.replace_quiz(vec!["Q1?".to_string()]);

        assert_eq!(
            session.load_document("b.txt", "Second document.".to_string()),
            DocumentChange::Replaced
        );
        assert_eq!(session.summary(), None);
        assert!(session.quiz().is_empty());
        assert!(session.quiz().answers().is_empty());

        // A late summary for the old document must not attach to the new one.
        assert!(!session.set_summary(first, "Stale.".to_string()));
        assert_eq!(session.summary(), None);
    }

    #[test]
    fn test_same_name_is_unchanged() {
        let mut session = Session::new();
        session.load_document("a.txt", "Text.".to_string());
        let id = session.require_document().unwrap().id();
        session.set_summary(id, "Summary.".to_string());

        assert_eq!(
            session.load_document("a.txt", "Other text.".to_string()),
            DocumentChange::Unchanged
        );
        assert_eq!(session.require_document().unwrap().text(), "Text.");
        assert_eq!(session.summary(), Some("Summary."));
    }

    #[test]
    fn test_quiz_answers_track_questions() {
        let mut session = Session::new();
        session.replace_quiz(vec!["A?".to_string(), "B?".to_string()]);
        assert_eq!(session.quiz().answers(), &["".to_string(), "".to_string()]);

        session.set_quiz_answer(1, "because").unwrap();
        assert_eq!(session.quiz().answers()[1], "because");
        assert!(matches!(
            session.set_quiz_answer(2, "x"),
            Err(AssistantError::QuestionIndex(2))
        ));

        session.replace_quiz(vec!["C?".to_string()]);
        assert_eq!(session.quiz().len(), 1);
        assert_eq!(session.quiz().answers().len(), 1);
        assert_eq!(session.quiz().answers()[0], "");
    }

    #[test]
    fn test_qna_log_survives_document_change() {
        let mut session = Session::new();
        session.load_document("a.txt", "A.".to_string());
        session.log_exchange("What?", "That.");
        session.load_document("b.txt", "B.".to_string());
        session.log_exchange("Why?", "Because.");

        assert_eq!(session.qna_log().len(), 2);
        assert_eq!(
            session.transcript(),
            "Q: What?\nA: That.\n\n\nQ: Why?\nA: Because.\n\n"
        );
        assert_eq!(session.stats().questions_asked, 2);
    }

    #[test]
    fn test_stats() {
        let mut session = Session::new();
        assert_eq!(session.stats(), SessionStats::default());

        session.load_document("a.txt", "one two three four".to_string());
        let id = session.require_document().unwrap().id();
        session.set_summary(id, "one two".to_string());
        let stats = session.stats();
        assert_eq!(stats.document_words, 4);
        assert_eq!(stats.summary_words, 2);
    }

    #[test]
    fn test_require_document() {
        let session = Session::new();
        assert!(matches!(
            session.require_document(),
            Err(AssistantError::NoDocument)
        ));
    }

    #[test]
    fn test_exports() {
        let mut session = Session::new();
        session.load_document("a.txt", "Body.".to_string());
        session.replace_quiz(vec!["What is it?".to_string()]);
        session.set_quiz_answer(0, "A body").unwrap();

        assert_eq!(session.export(Export::Document), "Body.");
        assert_eq!(session.export(Export::Summary), "");
        assert_eq!(
            session.export(Export::Quiz),
            "Question 1: What is it?\nYour answer: A body\n\n"
        );

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("exports");
        for which in Export::ALL {
            let path = session.export_to_dir(which, &out).unwrap();
            assert!(path.ends_with(which.default_filename()));
            assert!(path.exists());
        }
        assert_eq!(
            fs::read_to_string(out.join("document.txt")).unwrap(),
            "Body."
        );
    }
}
