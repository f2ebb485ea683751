//! Doc Quiz Assistant - summarize a document, answer questions about it and
//! quiz the reader on it.
//!
//! All of the language work is delegated to pre-trained models: a
//! summarizer, an extractive reader, a text generator and a sentence
//! encoder running behind a local inference server, or a hosted chat model.
//! This crate shapes the text going in, parses the text coming out and keeps
//! the session state consistent.
//!
//! # Quick Start
//!
//! ```no_run
//! use doc_quiz_assistant::{Assistant, Config, Mode, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let assistant = Assistant::from_config(&config, Mode::Local)?;
//!     let mut session = Session::new();
//!
//!     let bytes = std::fs::read("notes.txt")?;
//!     assistant.load_document(&mut session, "notes.txt", "text/plain", &bytes)?;
//!
//!     println!("{}", assistant.summary(&mut session).await?);
//!
//!     let answer = assistant.ask(&mut session, Mode::Local, "What is ATP?").await?;
//!     println!("{} ({:.2})", answer.answer, answer.score);
//!
//!     let count = assistant.generate_quiz(&mut session, Mode::Local).await?;
//!     if count > 0 {
//!         let feedback = assistant
//!             .answer_quiz(&mut session, Mode::Local, 0, "It stores energy")
//!             .await?;
//!         println!("{}", feedback);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **segmenter**: sentence splitting and answer justification
//! - **models**: local model gateway (summarize, extractive QA, question generation)
//! - **embeddings** / **matcher**: semantic evaluation of free-text answers
//! - **remote**: hosted chat model client and prompts
//! - **session** / **assistant**: session state and per-action orchestration

pub mod assistant;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod remote;
pub mod segmenter;
pub mod session;

// Re-export commonly used types
pub use assistant::{AskOutcome, Assistant, Feedback, Mode};
pub use config::Config;
pub use error::{AssistantError, Result};
pub use matcher::{Evaluation, SemanticMatcher, Verdict};
pub use models::{ModelGateway, ModelRegistry, QuestionParse};
pub use remote::RemoteModelClient;
pub use session::{DocumentChange, Export, Session};
