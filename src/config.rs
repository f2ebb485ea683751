//! Configuration for the document assistant.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.
//! The remote API key is never read from the file: it always comes from
//! the environment variable named by [`RemoteConfig::api_key_env`].

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Local model settings.
///
/// Each capability is served by an inference-pipeline endpoint at
/// `{api_base}/models/{model_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Base URL of the local inference server.
    pub api_base: String,

    /// Abstractive summarization model.
    pub summarization_model: String,

    /// Extractive question-answering model.
    pub qa_model: String,

    /// Causal text generation model.
    pub generation_model: String,

    /// Sentence-embedding model.
    pub embedding_model: String,

    /// Request timeout for a single inference call.
    pub timeout_secs: u64,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8080".to_string(),
            summarization_model: "facebook/bart-large-cnn".to_string(),
            qa_model: "distilbert-base-uncased-distilled-squad".to_string(),
            generation_model: "gpt2".to_string(),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Hosted chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL for the OpenAI-compatible API.
    pub api_base: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Value of the `HTTP-Referer` header identifying the calling application.
    pub referer: String,

    /// Value of the `X-Title` header identifying the calling application.
    pub title: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-r1-0528:free".to_string(),
            referer: "https://github.com/doc-quiz-assistant".to_string(),
            title: "SmartResearchAssistant".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Truncation budgets, generation parameters and the similarity threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Characters of the document passed to the summarizer.
    pub summary_input_chars: usize,

    /// Upper bound on summary length.
    pub summary_max_words: usize,

    /// Lower bound on summary length.
    pub summary_min_words: usize,

    /// Characters of the document passed to the question generator.
    pub question_input_chars: usize,

    /// Number of quiz questions requested.
    pub question_count: usize,

    /// Total length (prompt included) allowed for the question generator.
    pub generation_max_length: usize,

    /// Sampling temperature for the question generator.
    pub generation_temperature: f32,

    /// Fragments at or below this many characters are discarded by the
    /// question-mark fallback parser.
    pub fallback_min_chars: usize,

    /// Characters of the document embedded in remote prompts.
    pub remote_context_chars: usize,

    /// Cosine similarity a sentence must strictly exceed to count as a match.
    pub similarity_threshold: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            summary_input_chars: 2000,
            summary_max_words: 150,
            summary_min_words: 50,
            question_input_chars: 800,
            question_count: 3,
            generation_max_length: 300,
            generation_temperature: 0.7,
            fallback_min_chars: 10,
            remote_context_chars: 3000,
            similarity_threshold: 0.6,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Local model settings
    pub local: LocalModelConfig,
    /// Hosted model settings
    pub remote: RemoteConfig,
    /// Budgets and thresholds
    pub limits: Limits,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LOCAL_MODEL_API_BASE, REMOTE_API_BASE, REMOTE_MODEL, ...)
    /// 2. Config file (~/.config/doc-quiz-assistant/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(api_base) = env::var("LOCAL_MODEL_API_BASE") {
            self.local.api_base = api_base;
        }

        if let Ok(api_base) = env::var("REMOTE_API_BASE") {
            self.remote.api_base = api_base;
        }

        if let Ok(model) = env::var("REMOTE_MODEL") {
            self.remote.model = model;
        }

        if let Ok(timeout) = env::var("REMOTE_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.remote.timeout_secs = secs;
            }
        }

        if let Ok(threshold) = env::var("SIMILARITY_THRESHOLD") {
            if let Ok(value) = threshold.parse() {
                self.limits.similarity_threshold = value;
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AssistantError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AssistantError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "doc-quiz-assistant")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present and budgets are sane.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("local.api_base", &self.local.api_base),
            ("local.summarization_model", &self.local.summarization_model),
            ("local.qa_model", &self.local.qa_model),
            ("local.generation_model", &self.local.generation_model),
            ("local.embedding_model", &self.local.embedding_model),
            ("remote.api_base", &self.remote.api_base),
            ("remote.model", &self.remote.model),
            ("remote.api_key_env", &self.remote.api_key_env),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AssistantError::Config(format!("{} must not be empty", name)));
            }
        }

        let limits = &self.limits;
        if !(limits.similarity_threshold > 0.0 && limits.similarity_threshold <= 1.0) {
            return Err(AssistantError::Config(format!(
                "similarity_threshold must be in (0, 1], got {}",
                limits.similarity_threshold
            )));
        }

        if limits.summary_min_words > limits.summary_max_words {
            return Err(AssistantError::Config(format!(
                "summary_min_words ({}) exceeds summary_max_words ({})",
                limits.summary_min_words, limits.summary_max_words
            )));
        }

        let budgets = [
            ("summary_input_chars", limits.summary_input_chars),
            ("summary_max_words", limits.summary_max_words),
            ("question_input_chars", limits.question_input_chars),
            ("question_count", limits.question_count),
            ("generation_max_length", limits.generation_max_length),
            ("remote_context_chars", limits.remote_context_chars),
        ];
        for (name, value) in budgets {
            if value == 0 {
                return Err(AssistantError::Config(format!("{} must be positive", name)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.local.summarization_model, "facebook/bart-large-cnn");
        assert_eq!(config.remote.api_key_env, "API_KEY");
        assert_eq!(config.limits.summary_input_chars, 2000);
        assert_eq!(config.limits.question_input_chars, 800);
        assert_eq!(config.limits.remote_context_chars, 3000);
        assert_eq!(config.limits.similarity_threshold, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "limits:\n  similarity_threshold: 0.75\nremote:\n  model: some/other-model\n",
        )
        .unwrap();
        assert_eq!(config.limits.similarity_threshold, 0.75);
        assert_eq!(config.limits.question_count, 3);
        assert_eq!(config.remote.model, "some/other-model");
        assert_eq!(config.remote.timeout_secs, 120);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.limits.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_summary_bounds() {
        let mut config = Config::default();
        config.limits.summary_min_words = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let mut config = Config::default();
        config.local.qa_model = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "local:\n  api_base: http://models:9000\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.local.api_base, "http://models:9000");
    }
}
