//! Error types for the document assistant.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Errors that can occur while ingesting, querying or quizzing a document.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The uploaded file is neither PDF nor plain text.
    #[error("Unsupported file type '{0}'")]
    UnsupportedFileType(String),

    /// A question or answer field was blank.
    #[error("The {0} was empty")]
    EmptyInput(&'static str),

    /// An action needs a document but none is loaded.
    #[error("No document loaded")]
    NoDocument,

    /// A quiz answer was addressed to a question that does not exist.
    #[error("No quiz question at position {0}")]
    QuestionIndex(usize),

    /// A local model failed during inference.
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// The hosted completion endpoint returned an error or a malformed response.
    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    /// The hosted completion endpoint did not answer in time.
    #[error("Remote call timed out after {0}s")]
    RemoteTimeout(u64),

    /// HTTP transport error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Response or file parsing error.
    #[error("Failed to parse: {0}")]
    Parse(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AssistantError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from a model or the remote endpoint rather
    /// than from user input.
    pub fn is_inference_failure(&self) -> bool {
        matches!(
            self,
            Self::ModelInvocation(_) | Self::RemoteCall(_) | Self::RemoteTimeout(_) | Self::Http(_)
        )
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AssistantError {
    fn from(err: serde_json::Error) -> Self {
        AssistantError::Parse(err.to_string())
    }
}
