//! Inference-pipeline HTTP backend.
//!
//! Works with any server exposing models at `{api_base}/models/{model_id}`
//! using the pipeline request shape `{"inputs": ..., "parameters": ...}`
//! (Hugging Face inference servers and compatible local runners).

use super::{
    ExtractiveAnswer, GenerationParams, QuestionAnsweringModel, SummarizationModel, SummaryParams,
    TextGenerationModel,
};
use crate::config::LocalModelConfig;
use crate::embeddings::SentenceEncoder;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Request body for a pipeline call.
#[derive(Debug, Serialize)]
struct PipelineRequest<I: Serialize> {
    inputs: I,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaOutput {
    Single(ExtractiveAnswer),
    Ranked(Vec<ExtractiveAnswer>),
}

/// Pipeline error response.
#[derive(Debug, Deserialize)]
struct PipelineError {
    error: String,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

/// Shared HTTP client for one inference server.
#[derive(Clone)]
pub struct PipelineClient {
    client: Client,
    api_base: String,
    timeout_secs: u64,
}

impl PipelineClient {
    /// Create a client for the server described by `config`.
    pub fn new(config: &LocalModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Get the endpoint URL for a model.
    fn endpoint(&self, model_id: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/models/{}", base, model_id)
    }

    /// Run one pipeline call. Every failure is a model invocation failure.
    async fn infer<I, T>(
        &self,
        model_id: &str,
        inputs: I,
        parameters: Option<serde_json::Value>,
    ) -> Result<T>
    where
        I: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = PipelineRequest { inputs, parameters };

        let response = self
            .client
            .post(self.endpoint(model_id))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(model_id, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(model_id, e))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<PipelineError>(&body) {
                return Err(AssistantError::ModelInvocation(format!(
                    "{} ({}): {}",
                    model_id, status, err.error
                )));
            }
            return Err(AssistantError::ModelInvocation(format!(
                "{} ({}): {}",
                model_id, status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            AssistantError::ModelInvocation(format!(
                "{} returned an unexpected response: {}",
                model_id, e
            ))
        })
    }

    fn transport_error(&self, model_id: &str, err: reqwest::Error) -> AssistantError {
        if err.is_timeout() {
            AssistantError::ModelInvocation(format!(
                "{} did not respond within {}s",
                model_id, self.timeout_secs
            ))
        } else {
            AssistantError::ModelInvocation(format!("{}: {}", model_id, err))
        }
    }
}

/// One model served by a [`PipelineClient`].
#[derive(Clone)]
pub struct PipelineModel {
    client: PipelineClient,
    model_id: String,
}

impl PipelineModel {
    pub fn new(client: PipelineClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl SummarizationModel for PipelineModel {
    async fn summarize(&self, text: &str, params: SummaryParams) -> Result<String> {
        let parameters = json!({
            "max_length": params.max_length,
            "min_length": params.min_length,
            "do_sample": false,
        });

        let outputs: Vec<SummaryOutput> = self
            .client
            .infer(&self.model_id, text, Some(parameters))
            .await?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| AssistantError::ModelInvocation(format!("{} returned no summary", self.model_id)))
    }
}

#[async_trait]
impl QuestionAnsweringModel for PipelineModel {
    async fn answer(&self, question: &str, context: &str) -> Result<ExtractiveAnswer> {
        let output: QaOutput = self
            .client
            .infer(&self.model_id, QaInputs { question, context }, None)
            .await?;

        match output {
            QaOutput::Single(answer) => Ok(answer),
            QaOutput::Ranked(answers) => answers.into_iter().next().ok_or_else(|| {
                AssistantError::ModelInvocation(format!("{} returned no answer", self.model_id))
            }),
        }
    }
}

#[async_trait]
impl TextGenerationModel for PipelineModel {
    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let parameters = json!({
            "max_length": params.max_length,
            "temperature": params.temperature,
            "do_sample": params.do_sample,
            "num_return_sequences": 1,
            "return_full_text": false,
        });

        let outputs: Vec<GenerationOutput> = self
            .client
            .infer(&self.model_id, prompt, Some(parameters))
            .await?;

        let generated = outputs
            .into_iter()
            .next()
            .map(|o| o.generated_text)
            .ok_or_else(|| AssistantError::ModelInvocation(format!("{} returned no text", self.model_id)))?;

        debug!(model = %self.model_id, chars = generated.len(), "text generated");

        // Some servers ignore return_full_text.
        Ok(match generated.strip_prefix(prompt) {
            Some(continuation) => continuation.to_string(),
            None => generated,
        })
    }
}

#[async_trait]
impl SentenceEncoder for PipelineModel {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings: Vec<Vec<f32>> = self.client.infer(&self.model_id, texts, None).await?;

        if embeddings.len() != texts.len() {
            return Err(AssistantError::ModelInvocation(format!(
                "{} returned {} embeddings for {} inputs",
                self.model_id,
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_construction() {
        let config = LocalModelConfig {
            api_base: "http://127.0.0.1:8080/".to_string(),
            ..Default::default()
        };
        let client = PipelineClient::new(&config).unwrap();
        assert_eq!(client.endpoint("gpt2"), "http://127.0.0.1:8080/models/gpt2");
        assert_eq!(
            client.endpoint("facebook/bart-large-cnn"),
            "http://127.0.0.1:8080/models/facebook/bart-large-cnn"
        );
    }

    #[test]
    fn test_qa_output_shapes() {
        let single: QaOutput =
            serde_json::from_str(r#"{"answer": "ATP", "score": 0.8, "start": 1, "end": 4}"#).unwrap();
        assert!(matches!(single, QaOutput::Single(_)));

        let ranked: QaOutput =
            serde_json::from_str(r#"[{"answer": "ATP", "score": 0.8, "start": 1, "end": 4}]"#)
                .unwrap();
        assert!(matches!(ranked, QaOutput::Ranked(ref a) if a.len() == 1));
    }

    #[test]
    fn test_request_serialization() {
        let request = PipelineRequest {
            inputs: QaInputs {
                question: "What?",
                context: "This.",
            },
            parameters: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"inputs": {"question": "What?", "context": "This."}}));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_model_failure() {
        let config = LocalModelConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let model = PipelineModel::new(PipelineClient::new(&config).unwrap(), "gpt2");
        let params = GenerationParams {
            max_length: 10,
            temperature: 0.7,
            do_sample: true,
        };
        let err = model.generate("hello", params).await.unwrap_err();
        assert!(matches!(err, AssistantError::ModelInvocation(_)));
    }
}
