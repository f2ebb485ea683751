//! Hosted model integration.
//!
//! Mirrors the local gateway's operations (answer, generate questions,
//! evaluate) on top of a chat completion endpoint. Nothing is retried: any
//! transport, auth or format problem surfaces as a remote call failure.

mod client;
mod prompts;

pub use client::{ChatClient, Message, Role};
pub use prompts::Prompts;

use crate::config::RemoteConfig;
use crate::error::Result;
use crate::models::parse::remote_questions;
use crate::segmenter::truncate_chars;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Single-prompt chat completion.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// An answer from the hosted model.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAnswer {
    pub answer: String,
    /// Always [`RemoteAnswer::CONFIDENCE`]; the endpoint reports no score.
    pub score: f32,
}

impl RemoteAnswer {
    pub const CONFIDENCE: f32 = 1.0;
}

/// Answers, quizzes and grades through a hosted chat model.
#[derive(Clone)]
pub struct RemoteModelClient {
    chat: Arc<dyn ChatCompletion>,
    context_chars: usize,
}

impl RemoteModelClient {
    /// Build on the OpenAI-compatible client. Fails with a configuration
    /// error if the API key variable is unset.
    pub fn from_config(config: &RemoteConfig, context_chars: usize) -> Result<Self> {
        let client = ChatClient::from_config(config.clone())?;
        Ok(Self::new(Arc::new(client), context_chars))
    }

    pub fn new(chat: Arc<dyn ChatCompletion>, context_chars: usize) -> Self {
        Self {
            chat,
            context_chars,
        }
    }

    fn context<'a>(&self, context: &'a str) -> &'a str {
        truncate_chars(context, self.context_chars)
    }

    /// Answer `question` from the head of `context`, verbatim.
    pub async fn answer(&self, question: &str, context: &str) -> Result<RemoteAnswer> {
        let prompt = Prompts::answer(self.context(context), question);
        let answer = self.chat.complete(&prompt).await?;
        info!(chars = answer.len(), "remote answer received");

        Ok(RemoteAnswer {
            answer,
            score: RemoteAnswer::CONFIDENCE,
        })
    }

    /// Ask for three numbered questions. Whatever lines parse are returned,
    /// no more and no fewer.
    pub async fn generate_questions(&self, context: &str) -> Result<Vec<String>> {
        let prompt = Prompts::generate_questions(self.context(context));
        let raw = self.chat.complete(&prompt).await?;
        let questions = remote_questions(&raw);
        info!(questions = questions.len(), "remote questions parsed");
        Ok(questions)
    }

    /// Categorical judgement of `answer` with a one-line justification, verbatim.
    pub async fn evaluate(&self, answer: &str, context: &str, question: &str) -> Result<String> {
        let prompt = Prompts::evaluate(self.context(context), question, answer);
        let feedback = self.chat.complete(&prompt).await?;
        Ok(feedback.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use std::sync::Mutex;

    struct Scripted {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatCompletion for Scripted {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl ChatCompletion for Unreachable {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(AssistantError::RemoteCall("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_answer_is_verbatim_with_placeholder_score() {
        let chat = Scripted::new("  The cell's powerhouse.\n");
        let client = RemoteModelClient::new(chat.clone(), 3000);

        let context = "a".repeat(5000);
        let answer = client.answer("What is it?", &context).await.unwrap();

        assert_eq!(answer.answer, "  The cell's powerhouse.\n");
        assert_eq!(answer.score, 1.0);

        let prompt = &chat.prompts.lock().unwrap()[0];
        assert!(prompt.contains(&"a".repeat(3000)));
        assert!(!prompt.contains(&"a".repeat(3001)));
    }

    #[tokio::test]
    async fn test_generate_questions_parses_numbered_reply() {
        let chat = Scripted::new("Here you go:\n1. What is ATP?\n2. Where is it made?\n3. Why does it matter?");
        let client = RemoteModelClient::new(chat, 3000);

        let questions = client.generate_questions("Doc.").await.unwrap();
        assert_eq!(
            questions,
            vec!["What is ATP?", "Where is it made?", "Why does it matter?"]
        );
    }

    #[tokio::test]
    async fn test_generate_questions_does_not_enforce_count() {
        let chat = Scripted::new("1. Only one question?");
        let client = RemoteModelClient::new(chat, 3000);
        assert_eq!(client.generate_questions("Doc.").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_returns_trimmed_feedback() {
        let chat = Scripted::new("\nPartially correct - it misses respiration.\n");
        let client = RemoteModelClient::new(chat.clone(), 3000);

        let feedback = client
            .evaluate("It makes ATP", "Mitochondria make ATP.", "What do mitochondria do?")
            .await
            .unwrap();
        assert_eq!(feedback, "Partially correct - it misses respiration.");

        let prompt = &chat.prompts.lock().unwrap()[0];
        assert!(prompt.contains("Question: What do mitochondria do?\nAnswer: It makes ATP"));
    }

    #[tokio::test]
    async fn test_failures_propagate() {
        let client = RemoteModelClient::new(Arc::new(Unreachable), 3000);
        assert!(matches!(
            client.answer("Q?", "Doc.").await.unwrap_err(),
            AssistantError::RemoteCall(_)
        ));
        assert!(client.generate_questions("Doc.").await.is_err());
        assert!(client.evaluate("A", "Doc.", "Q?").await.is_err());
    }

    #[test]
    fn test_missing_key_fails_construction() {
        let config = RemoteConfig {
            api_key_env: "DOC_QUIZ_ASSISTANT_TEST_ABSENT_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            RemoteModelClient::from_config(&config, 3000),
            Err(AssistantError::Config(_))
        ));
    }
}
