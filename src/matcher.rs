//! Semantic matching of a free-text answer against a document.
//!
//! The document is split into sentences and the candidate answer is compared
//! with every one of them by cosine similarity of their embeddings. The best
//! sentence wins if it clears the configured threshold.

use crate::embeddings::{SentenceEncoder, cosine_similarity};
use crate::error::{AssistantError, Result};
use crate::segmenter::segment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Whether a candidate answer is supported by the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Match,
    NoMatch,
}

/// Result of scoring a candidate answer. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    /// Closest document sentence; only set on a match.
    pub best_sentence: Option<String>,
    /// Highest similarity seen, rounded to two decimals.
    pub score: f32,
}

impl Evaluation {
    fn no_match(score: f32) -> Self {
        Self {
            verdict: Verdict::NoMatch,
            best_sentence: None,
            score,
        }
    }

    pub fn is_match(&self) -> bool {
        self.verdict == Verdict::Match
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.verdict, &self.best_sentence) {
            (Verdict::Match, Some(sentence)) => write!(
                f,
                "Match found. Closest sentence: {} (Score: {:.2})",
                sentence, self.score
            ),
            _ => write!(f, "No strong semantic match in the document."),
        }
    }
}

/// Scores answers with a sentence encoder and a similarity threshold.
#[derive(Clone)]
pub struct SemanticMatcher {
    encoder: Arc<dyn SentenceEncoder>,
    threshold: f32,
}

impl SemanticMatcher {
    pub fn new(encoder: Arc<dyn SentenceEncoder>, threshold: f32) -> Self {
        Self { encoder, threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Compare `candidate` with every sentence of `context`.
    ///
    /// An empty context yields [`Verdict::NoMatch`] without calling the encoder.
    pub async fn score_answer(&self, candidate: &str, context: &str) -> Result<Evaluation> {
        let sentences = segment(context);
        if sentences.is_empty() {
            return Ok(Evaluation::no_match(0.0));
        }

        let mut inputs = Vec::with_capacity(sentences.len() + 1);
        inputs.push(candidate.to_string());
        inputs.extend(sentences.iter().cloned());

        let embeddings = self.encoder.encode(&inputs).await?;
        let (candidate_vec, sentence_vecs) = embeddings.split_first().ok_or_else(|| {
            AssistantError::ModelInvocation("Encoder returned no embeddings".to_string())
        })?;

        let best = sentence_vecs
            .iter()
            .map(|v| cosine_similarity(candidate_vec, v))
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (idx, sim)| match best {
                Some((_, top)) if top >= sim => best,
                _ => Some((idx, sim)),
            });

        let Some((idx, max_sim)) = best else {
            return Ok(Evaluation::no_match(0.0));
        };

        debug!(max_sim, sentences = sentences.len(), "answer scored");

        let score = (max_sim * 100.0).round() / 100.0;
        if max_sim > self.threshold {
            Ok(Evaluation {
                verdict: Verdict::Match,
                best_sentence: sentences.into_iter().nth(idx),
                score,
            })
        } else {
            Ok(Evaluation::no_match(score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each text to a fixed vector chosen by the test.
    struct TableEncoder {
        table: Vec<(&'static str, Vec<f32>)>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SentenceEncoder for TableEncoder {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    self.table
                        .iter()
                        .find(|(k, _)| *k == t.as_str())
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| vec![0.0, 0.0, 1.0])
                })
                .collect())
        }
    }

    fn matcher(table: Vec<(&'static str, Vec<f32>)>) -> (SemanticMatcher, Arc<TableEncoder>) {
        let encoder = Arc::new(TableEncoder {
            table,
            calls: AtomicUsize::new(0),
        });
        (SemanticMatcher::new(encoder.clone(), 0.6), encoder)
    }

    #[tokio::test]
    async fn test_best_sentence_above_threshold_matches() {
        let (m, _) = matcher(vec![
            ("answer", vec![1.0, 0.0, 0.0]),
            ("First one.", vec![0.0, 1.0, 0.0]),
            ("Second one.", vec![0.9, 0.1, 0.0]),
        ]);
        let eval = m.score_answer("answer", "First one. Second one.").await.unwrap();
        assert_eq!(eval.verdict, Verdict::Match);
        assert_eq!(eval.best_sentence.as_deref(), Some("Second one."));
        assert!(eval.score > 0.6);
    }

    #[tokio::test]
    async fn test_threshold_is_strict() {
        // cos = 3 / 5 = 0.6 exactly
        let (m, _) = matcher(vec![
            ("answer", vec![1.0, 0.0]),
            ("Only sentence.", vec![3.0, 4.0]),
        ]);
        let eval = m.score_answer("answer", "Only sentence.").await.unwrap();
        assert_eq!(eval.verdict, Verdict::NoMatch);
        assert!(eval.best_sentence.is_none());
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let encoder = Arc::new(TableEncoder {
            table: vec![("answer", vec![1.0, 0.0]), ("Only sentence.", vec![3.0, 4.0])],
            calls: AtomicUsize::new(0),
        });
        let m = SemanticMatcher::new(encoder, 0.5);
        let eval = m.score_answer("answer", "Only sentence.").await.unwrap();
        assert!(eval.is_match());
        assert_eq!(eval.score, 0.6);
    }

    #[tokio::test]
    async fn test_empty_context_is_no_match() {
        let (m, encoder) = matcher(vec![]);
        let eval = m.score_answer("anything", "").await.unwrap();
        assert_eq!(eval.verdict, Verdict::NoMatch);
        assert_eq!(eval.score, 0.0);
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_display() {
        let eval = Evaluation {
            verdict: Verdict::Match,
            best_sentence: Some("It produces ATP.".to_string()),
            score: 0.67,
        };
        assert_eq!(
            eval.to_string(),
            "Match found. Closest sentence: It produces ATP. (Score: 0.67)"
        );
        assert_eq!(
            Evaluation::no_match(0.2).to_string(),
            "No strong semantic match in the document."
        );
    }
}
