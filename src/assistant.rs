//! Orchestration of user actions over a [`Session`].
//!
//! Each action picks the local gateway or the hosted model according to the
//! requested [`Mode`], runs it, and only then commits results to the
//! session. A failing action leaves the session exactly as it was.

use crate::config::{Config, Limits};
use crate::error::{AssistantError, Result};
use crate::ingest::{self, Extraction};
use crate::matcher::{Evaluation, SemanticMatcher};
use crate::models::{ModelGateway, ModelRegistry};
use crate::remote::RemoteModelClient;
use crate::segmenter::justify;
use crate::session::{DocumentChange, Session};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Where an action is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Local,
    Remote,
}

impl FromStr for Mode {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Mode::Local),
            "remote" | "cloud" => Ok(Mode::Remote),
            other => Err(AssistantError::Config(format!("Unknown mode '{}'", other))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => write!(f, "local"),
            Mode::Remote => write!(f, "remote"),
        }
    }
}

/// Answer to a free-form question.
#[derive(Debug, Clone, PartialEq)]
pub struct AskOutcome {
    pub answer: String,
    pub score: f32,
    /// Document sentence containing the answer (local mode only).
    pub justification: Option<String>,
}

/// Feedback on a quiz answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// Local semantic match against the document.
    Semantic(Evaluation),
    /// Categorical judgement written by the hosted model.
    Graded(String),
}

impl Feedback {
    pub fn is_positive(&self) -> bool {
        match self {
            Feedback::Semantic(eval) => eval.is_match(),
            Feedback::Graded(text) => {
                let lower = text.to_lowercase();
                lower.contains("correct") && !lower.contains("incorrect")
            }
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feedback::Semantic(eval) => write!(f, "{}", eval),
            Feedback::Graded(text) => write!(f, "{}", text),
        }
    }
}

/// Routes user actions to the local gateway or the hosted model.
#[derive(Clone)]
pub struct Assistant {
    gateway: ModelGateway,
    remote: Option<RemoteModelClient>,
}

impl Assistant {
    pub fn new(gateway: ModelGateway, remote: Option<RemoteModelClient>) -> Self {
        Self { gateway, remote }
    }

    /// Build from configuration using the process-wide model registry.
    ///
    /// With [`Mode::Remote`] the hosted client is constructed eagerly, so a
    /// missing API key fails here, before any request is made.
    pub fn from_config(config: &Config, mode: Mode) -> Result<Self> {
        config.validate()?;

        let registry = ModelRegistry::global(&config.local);
        let gateway = ModelGateway::new(registry, config.limits.clone());

        let remote = match mode {
            Mode::Remote => Some(RemoteModelClient::from_config(
                &config.remote,
                config.limits.remote_context_chars,
            )?),
            Mode::Local => None,
        };

        Ok(Self::new(gateway, remote))
    }

    fn limits(&self) -> &Limits {
        self.gateway.limits()
    }

    fn remote(&self) -> Result<&RemoteModelClient> {
        self.remote.as_ref().ok_or_else(|| {
            AssistantError::Config("Remote mode selected but no remote client is configured".to_string())
        })
    }

    /// Extract and load an uploaded file.
    pub fn load_document(
        &self,
        session: &mut Session,
        name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> Result<DocumentChange> {
        let result = ingest::extract(bytes, mime).and_then(Extraction::require_text);
        let text = surfaced("load document", result)?;
        let change = session.load_document(name, text);

        match change {
            DocumentChange::Replaced => info!(document = %name, "document loaded"),
            DocumentChange::Unchanged => info!(document = %name, "using cached document"),
        }
        Ok(change)
    }

    /// Summary of the active document, generated on first request and
    /// regenerated whenever the document changes.
    pub async fn summary(&self, session: &mut Session) -> Result<String> {
        if let Some(summary) = session.summary() {
            return Ok(summary.to_string());
        }

        let document = session.require_document()?;
        let id = document.id();
        let result = self
            .gateway
            .summarize(document.text(), self.limits().summary_max_words)
            .await;
        let summary = surfaced("summarize", result)?;

        session.set_summary(id, summary.clone());
        Ok(summary)
    }

    /// Answer a question about the active document and log the exchange.
    pub async fn ask(&self, session: &mut Session, mode: Mode, question: &str) -> Result<AskOutcome> {
        if question.trim().is_empty() {
            return Err(AssistantError::EmptyInput("question"));
        }
        let document = session.require_document()?;
        if document.text().trim().is_empty() {
            return Err(AssistantError::EmptyInput("document"));
        }

        let outcome = match mode {
            Mode::Local => {
                let result = self.gateway.answer_extractive(question, document.text()).await;
                let answer = surfaced("answer question", result)?;
                let justification = justify(&answer.answer, document.text());
                AskOutcome {
                    answer: answer.answer,
                    score: answer.score,
                    justification,
                }
            }
            Mode::Remote => {
                let result = self.remote()?.answer(question, document.text()).await;
                let answer = surfaced("answer question", result)?;
                AskOutcome {
                    answer: answer.answer,
                    score: answer.score,
                    justification: None,
                }
            }
        };

        session.log_exchange(question, outcome.answer.clone());
        info!(%mode, score = outcome.score, "question answered");
        Ok(outcome)
    }

    /// Generate a new quiz, replacing questions and answers together.
    /// Returns the number of questions; zero is a valid outcome.
    pub async fn generate_quiz(&self, session: &mut Session, mode: Mode) -> Result<usize> {
        let document = session.require_document()?;

        let questions = match mode {
            Mode::Local => {
                let result = self
                    .gateway
                    .generate_questions(document.text(), self.limits().question_count)
                    .await;
                surfaced("generate questions", result)?.into_questions()
            }
            Mode::Remote => {
                let result = self.remote()?.generate_questions(document.text()).await;
                surfaced("generate questions", result)?
            }
        };

        if questions.is_empty() {
            warn!(%mode, "no questions generated");
        }

        let count = questions.len();
        session.replace_quiz(questions);
        info!(%mode, count, "quiz generated");
        Ok(count)
    }

    /// Evaluate the user's answer to quiz question `index` and, once that
    /// succeeds, record it. A blank answer or a failed evaluation leaves the
    /// stored answer untouched.
    pub async fn answer_quiz(
        &self,
        session: &mut Session,
        mode: Mode,
        index: usize,
        answer: &str,
    ) -> Result<Feedback> {
        if answer.trim().is_empty() {
            return Err(AssistantError::EmptyInput("answer"));
        }
        let question = session.quiz().question(index)?;

        let feedback = self.evaluate(session, mode, question, answer).await?;
        session.set_quiz_answer(index, answer)?;
        info!(%mode, index, positive = feedback.is_positive(), "answer evaluated");
        Ok(feedback)
    }

    /// Evaluate the stored answer to quiz question `index`.
    pub async fn evaluate_answer(&self, session: &Session, mode: Mode, index: usize) -> Result<Feedback> {
        let quiz = session.quiz();
        let question = quiz.question(index)?;
        let answer = &quiz.answers()[index];
        if answer.trim().is_empty() {
            return Err(AssistantError::EmptyInput("answer"));
        }

        let feedback = self.evaluate(session, mode, question, answer).await?;
        info!(%mode, index, positive = feedback.is_positive(), "answer evaluated");
        Ok(feedback)
    }

    async fn evaluate(&self, session: &Session, mode: Mode, question: &str, answer: &str) -> Result<Feedback> {
        let document = session.require_document()?;

        let feedback = match mode {
            Mode::Local => {
                let encoder = surfaced("load encoder", self.gateway.registry().encoder().await)?;
                let matcher = SemanticMatcher::new(encoder, self.limits().similarity_threshold);
                let result = matcher.score_answer(answer, document.text()).await;
                Feedback::Semantic(surfaced("evaluate answer", result)?)
            }
            Mode::Remote => {
                let result = self
                    .remote()?
                    .evaluate(answer, document.text(), question)
                    .await;
                Feedback::Graded(surfaced("evaluate answer", result)?)
            }
        };

        Ok(feedback)
    }
}

/// Log a failed action before handing the error back to the caller.
fn surfaced<T>(action: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        warn!(action, error = %err, "action failed");
    }
    result
}
