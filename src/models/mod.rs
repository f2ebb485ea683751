//! Local model gateway.
//!
//! Three pre-trained capabilities sit behind small traits: abstractive
//! summarization, extractive question answering and open-ended text
//! generation. The default backends speak the inference-pipeline HTTP
//! contract ([`PipelineModel`]); tests and embedders can plug in their own.
//! Backends are created lazily and at most once by the [`ModelRegistry`].

mod gateway;
pub mod parse;
mod pipeline;
mod registry;

pub use gateway::ModelGateway;
pub use parse::QuestionParse;
pub use pipeline::{PipelineClient, PipelineModel};
pub use registry::ModelRegistry;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Length bounds passed to a summarization model, in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParams {
    pub max_length: usize,
    pub min_length: usize,
}

/// Sampling parameters for a text generation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Total length including the prompt.
    pub max_length: usize,
    pub temperature: f32,
    pub do_sample: bool,
}

/// A span selected from the context by an extractive reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractiveAnswer {
    pub answer: String,
    /// Confidence reported by the model, unmodified.
    pub score: f32,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
}

impl ExtractiveAnswer {
    /// Answer text returned for a blank question.
    pub const EMPTY_QUESTION: &'static str = "Question was empty";

    /// Sentinel result for a blank question. Never produced by a model.
    pub fn empty_question() -> Self {
        Self {
            answer: Self::EMPTY_QUESTION.to_string(),
            score: 0.0,
            start: 0,
            end: 0,
        }
    }

    pub fn is_empty_question(&self) -> bool {
        self.answer == Self::EMPTY_QUESTION && self.score == 0.0
    }
}

/// Abstractive summarization.
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    async fn summarize(&self, text: &str, params: SummaryParams) -> Result<String>;
}

/// Extractive question answering over a context passage.
#[async_trait]
pub trait QuestionAnsweringModel: Send + Sync {
    async fn answer(&self, question: &str, context: &str) -> Result<ExtractiveAnswer>;
}

/// Causal text generation. Returns only the text generated after `prompt`.
#[async_trait]
pub trait TextGenerationModel: Send + Sync {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String>;
}
