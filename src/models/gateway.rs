//! Summarize, answer and generate questions with the local models.

use super::{
    ExtractiveAnswer, GenerationParams, ModelRegistry, QuestionParse, SummaryParams,
};
use crate::config::Limits;
use crate::error::{AssistantError, Result};
use crate::segmenter::{truncate_chars, word_count};
use std::sync::Arc;
use tracing::{debug, info};

/// Shapes text going into the local models and parses what comes out.
#[derive(Clone)]
pub struct ModelGateway {
    registry: Arc<ModelRegistry>,
    limits: Limits,
}

impl ModelGateway {
    pub fn new(registry: Arc<ModelRegistry>, limits: Limits) -> Self {
        Self { registry, limits }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Summarize the head of `text`.
    ///
    /// Only the first `summary_input_chars` characters reach the model.
    /// The result never exceeds `max_words` words.
    pub async fn summarize(&self, text: &str, max_words: usize) -> Result<String> {
        if text.trim().is_empty() {
            return Err(AssistantError::EmptyInput("document"));
        }

        let input = truncate_chars(text, self.limits.summary_input_chars);
        let params = SummaryParams {
            max_length: max_words,
            min_length: self.limits.summary_min_words.min(max_words),
        };

        let model = self.registry.summarizer().await?;
        let summary = model.summarize(input, params).await?;

        info!(
            input_chars = input.chars().count(),
            words = word_count(&summary),
            "summary generated"
        );

        Ok(cap_words(summary.trim(), max_words))
    }

    /// Extract an answer span for `question` from `context`.
    ///
    /// A blank question returns [`ExtractiveAnswer::empty_question`] without
    /// touching the model.
    pub async fn answer_extractive(&self, question: &str, context: &str) -> Result<ExtractiveAnswer> {
        if question.trim().is_empty() {
            return Ok(ExtractiveAnswer::empty_question());
        }

        let model = self.registry.reader().await?;
        let answer = model.answer(question, context).await?;
        debug!(score = answer.score, "extractive answer");
        Ok(answer)
    }

    /// Ask the generator for `count` comprehension questions about the head
    /// of `text`. May return fewer, or none.
    pub async fn generate_questions(&self, text: &str, count: usize) -> Result<QuestionParse> {
        if count == 0 {
            return Ok(QuestionParse::Empty);
        }

        let flattened = text.trim().replace('\n', " ");
        let input = truncate_chars(&flattened, self.limits.question_input_chars);
        let prompt = question_prompt(input, count);

        let params = GenerationParams {
            max_length: self.limits.generation_max_length,
            temperature: self.limits.generation_temperature,
            do_sample: true,
        };

        let model = self.registry.generator().await?;
        let continuation = model.generate(&prompt, params).await?;

        // The prompt ends with the first list marker; put it back so the
        // first generated question is enumerated like the rest.
        let output = format!("1.{}", continuation);
        let parsed = QuestionParse::parse(&output, self.limits.fallback_min_chars).truncate(count);

        info!(
            questions = parsed.len(),
            fallback = parsed.used_fallback(),
            "questions parsed"
        );

        Ok(parsed)
    }
}

fn question_prompt(text: &str, count: usize) -> String {
    format!(
        "Read the following paragraph and generate {} comprehension questions:\n\n{}\n\nQuestions:\n1.",
        count, text
    )
}

fn cap_words(text: &str, max_words: usize) -> String {
    if word_count(text) <= max_words {
        text.to_string()
    } else {
        text.split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
