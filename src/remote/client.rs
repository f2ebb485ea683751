//! OpenAI-compatible chat completion client.
//!
//! Works with any OpenAI-compatible endpoint (OpenRouter by default). Every
//! request carries the fixed model identifier and the application headers
//! from [`RemoteConfig`].

use super::ChatCompletion;
use crate::config::RemoteConfig;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Message role in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for chat completion.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

/// Response from chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API error response.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI-compatible chat client.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    config: RemoteConfig,
    api_key: String,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("api_base", &self.config.api_base)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl ChatClient {
    /// Create a client, reading the API key from the environment variable
    /// named in `config`. Fails before any network activity if it is unset.
    pub fn from_config(config: RemoteConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AssistantError::Config(format!(
                    "Remote API key is required. Set the {} environment variable.",
                    config.api_key_env
                ))
            })?;

        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(config: RemoteConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// Get the API endpoint URL.
    fn endpoint(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Send a chat completion request and return the first choice's text.
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
        };

        debug!(model = %self.config.model, "sending chat completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                return Err(AssistantError::RemoteCall(format!(
                    "API error ({}): {}",
                    status, api_error.error.message
                )));
            }
            return Err(AssistantError::RemoteCall(format!(
                "Request failed ({}): {}",
                status, body
            )));
        }

        parse_completion(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> AssistantError {
        if err.is_timeout() {
            AssistantError::RemoteTimeout(self.config.timeout_secs)
        } else {
            AssistantError::RemoteCall(err.to_string())
        }
    }

    /// Test connectivity to the API.
    pub async fn test_connection(&self) -> Result<()> {
        let reply = self
            .chat(vec![Message::user("Say 'hello' and nothing else.")])
            .await?;

        if reply.to_lowercase().contains("hello") {
            info!("remote endpoint reachable");
            Ok(())
        } else {
            Err(AssistantError::RemoteCall(format!(
                "Unexpected response: {}",
                reply
            )))
        }
    }
}

fn parse_completion(body: &str) -> Result<String> {
    let completion: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AssistantError::RemoteCall(format!("Malformed response: {}", e)))?;

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AssistantError::RemoteCall("No completion text in response".to_string()))
}

#[async_trait]
impl ChatCompletion for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(vec![Message::user(prompt)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_base: &str) -> RemoteConfig {
        RemoteConfig {
            api_base: api_base.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_message_creation() {
        let user = Message::user("Hello!");
        assert!(matches!(user.role, Role::User));
        assert_eq!(user.content, "Hello!");
    }

    #[test]
    fn test_endpoint_construction() {
        let client = ChatClient::with_api_key(config("https://openrouter.ai/api/v1"), "k").unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");

        let client = ChatClient::with_api_key(config("https://api.example.com/"), "k").unwrap();
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");

        let client = ChatClient::with_api_key(
            config("https://proxy.example.com/v1/chat/completions"),
            "k",
        )
        .unwrap();
        assert_eq!(client.endpoint(), "https://proxy.example.com/v1/chat/completions");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = RemoteConfig {
            api_key_env: "DOC_QUIZ_ASSISTANT_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let err = ChatClient::from_config(config).unwrap_err();
        assert!(matches!(err, AssistantError::Config(_)));
        assert!(err.to_string().contains("DOC_QUIZ_ASSISTANT_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "deepseek/deepseek-r1-0528:free",
            messages: vec![Message::user("Q")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "deepseek/deepseek-r1-0528:free");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Q");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Correct. It says so."}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Correct. It says so.");

        let empty = r#"{"choices": []}"#;
        assert!(matches!(
            parse_completion(empty).unwrap_err(),
            AssistantError::RemoteCall(_)
        ));

        assert!(matches!(
            parse_completion("not json").unwrap_err(),
            AssistantError::RemoteCall(_)
        ));
    }
}
