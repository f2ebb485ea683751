//! Lazily initialised model backends.
//!
//! Each backend is created the first time it is needed and reused for the
//! rest of the process. Concurrent first calls wait on the same
//! initialisation; a failed initialisation is not cached and is retried by
//! the next caller.

use super::{PipelineClient, PipelineModel, QuestionAnsweringModel, SummarizationModel, TextGenerationModel};
use crate::config::LocalModelConfig;
use crate::embeddings::SentenceEncoder;
use crate::error::{AssistantError, Result};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::info;

static GLOBAL: OnceLock<Arc<ModelRegistry>> = OnceLock::new();

/// Process-wide cache of model backends.
pub struct ModelRegistry {
    config: LocalModelConfig,
    client: OnceCell<PipelineClient>,
    summarizer: OnceCell<Arc<dyn SummarizationModel>>,
    reader: OnceCell<Arc<dyn QuestionAnsweringModel>>,
    generator: OnceCell<Arc<dyn TextGenerationModel>>,
    encoder: OnceCell<Arc<dyn SentenceEncoder>>,
}

impl ModelRegistry {
    /// Create an empty registry. Nothing is loaded until first use.
    pub fn new(config: LocalModelConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
            summarizer: OnceCell::new(),
            reader: OnceCell::new(),
            generator: OnceCell::new(),
            encoder: OnceCell::new(),
        }
    }

    /// The shared registry for this process. The configuration of the first
    /// caller wins; later calls return the same instance.
    pub fn global(config: &LocalModelConfig) -> Arc<ModelRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(ModelRegistry::new(config.clone())))
            .clone()
    }

    /// Use `model` for summarization instead of loading one.
    pub fn with_summarizer(mut self, model: Arc<dyn SummarizationModel>) -> Self {
        self.summarizer = OnceCell::new_with(Some(model));
        self
    }

    /// Use `model` for question answering instead of loading one.
    pub fn with_reader(mut self, model: Arc<dyn QuestionAnsweringModel>) -> Self {
        self.reader = OnceCell::new_with(Some(model));
        self
    }

    /// Use `model` for text generation instead of loading one.
    pub fn with_generator(mut self, model: Arc<dyn TextGenerationModel>) -> Self {
        self.generator = OnceCell::new_with(Some(model));
        self
    }

    /// Use `encoder` for sentence embeddings instead of loading one.
    pub fn with_encoder(mut self, encoder: Arc<dyn SentenceEncoder>) -> Self {
        self.encoder = OnceCell::new_with(Some(encoder));
        self
    }

    pub fn config(&self) -> &LocalModelConfig {
        &self.config
    }

    async fn client(&self) -> Result<PipelineClient> {
        self.client
            .get_or_try_init(|| async { PipelineClient::new(&self.config) })
            .await
            .cloned()
    }

    async fn pipeline(&self, model_id: &str) -> Result<PipelineModel> {
        info!(model = %model_id, "loading model");
        Ok(PipelineModel::new(self.client().await?, model_id))
    }

    pub async fn summarizer(&self) -> Result<Arc<dyn SummarizationModel>> {
        self.summarizer
            .get_or_try_init(|| async {
                let model = self.pipeline(&self.config.summarization_model).await?;
                Ok::<Arc<dyn SummarizationModel>, AssistantError>(Arc::new(model))
            })
            .await
            .cloned()
    }

    pub async fn reader(&self) -> Result<Arc<dyn QuestionAnsweringModel>> {
        self.reader
            .get_or_try_init(|| async {
                let model = self.pipeline(&self.config.qa_model).await?;
                Ok::<Arc<dyn QuestionAnsweringModel>, AssistantError>(Arc::new(model))
            })
            .await
            .cloned()
    }

    pub async fn generator(&self) -> Result<Arc<dyn TextGenerationModel>> {
        self.generator
            .get_or_try_init(|| async {
                let model = self.pipeline(&self.config.generation_model).await?;
                Ok::<Arc<dyn TextGenerationModel>, AssistantError>(Arc::new(model))
            })
            .await
            .cloned()
    }

    pub async fn encoder(&self) -> Result<Arc<dyn SentenceEncoder>> {
        self.encoder
            .get_or_try_init(|| self.load_encoder())
            .await
            .cloned()
    }

    #[cfg(not(feature = "candle"))]
    async fn load_encoder(&self) -> Result<Arc<dyn SentenceEncoder>> {
        let model = self.pipeline(&self.config.embedding_model).await?;
        Ok(Arc::new(model))
    }

    #[cfg(feature = "candle")]
    async fn load_encoder(&self) -> Result<Arc<dyn SentenceEncoder>> {
        use crate::embeddings::BertSentenceEncoder;

        let model_id = self.config.embedding_model.clone();
        info!(model = %model_id, "loading in-process sentence encoder");
        let encoder = tokio::task::spawn_blocking(move || BertSentenceEncoder::load(&model_id))
            .await
            .map_err(|e| AssistantError::ModelInvocation(format!("Encoder load panicked: {}", e)))??;
        Ok(Arc::new(encoder))
    }
}
