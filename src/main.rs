//! Doc Quiz Assistant CLI
//!
//! Summarize a document, ask questions about it and take a comprehension quiz.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use doc_quiz_assistant::{
    Assistant, Config, Mode, Session,
    ingest::mime_for_path,
    remote::ChatClient,
    session::Export,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Doc Quiz Assistant - document QA and comprehension quizzes
#[derive(Parser)]
#[command(name = "doc-assistant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Where questions, quizzes and evaluations are computed
    #[arg(short, long, value_enum, default_value_t = ModeArg::Local, global = true)]
    mode: ModeArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Local,
    Remote,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Local => Mode::Local,
            ModeArg::Remote => Mode::Remote,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a document (always computed locally)
    Summarize {
        /// Path to a PDF or text file
        document: PathBuf,
    },

    /// Answer a question about a document
    Ask {
        /// Path to a PDF or text file
        document: PathBuf,

        /// The question to ask
        question: String,
    },

    /// Generate comprehension questions for a document
    Quiz {
        /// Path to a PDF or text file
        document: PathBuf,
    },

    /// Evaluate an answer to a question against a document
    Evaluate {
        /// Path to a PDF or text file
        document: PathBuf,

        /// The question being answered
        #[arg(short, long)]
        question: String,

        /// The answer to evaluate
        #[arg(short, long)]
        answer: String,
    },

    /// Interactive session over one document
    Session {
        /// Path to a PDF or text file
        document: PathBuf,
    },

    /// Test the connection to the hosted model
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = Mode::from(cli.mode);

    match cli.command {
        Commands::Summarize { document } => cmd_summarize(document).await,
        Commands::Ask { document, question } => cmd_ask(mode, document, question).await,
        Commands::Quiz { document } => cmd_quiz(mode, document).await,
        Commands::Evaluate {
            document,
            question,
            answer,
        } => cmd_evaluate(mode, document, question, answer).await,
        Commands::Session { document } => cmd_session(mode, document).await,
        Commands::Check => cmd_check().await,
    }
}

fn build(mode: Mode) -> Result<Assistant> {
    let config = Config::load().context("Failed to load configuration")?;
    Assistant::from_config(&config, mode).context("Failed to set up assistant")
}

fn open(assistant: &Assistant, path: &Path) -> Result<Session> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut session = Session::new();
    assistant
        .load_document(&mut session, &name, mime_for_path(path), &bytes)
        .context("Failed to load document")?;
    Ok(session)
}

async fn cmd_summarize(document: PathBuf) -> Result<()> {
    let assistant = build(Mode::Local)?;
    let mut session = open(&assistant, &document)?;

    let start = Instant::now();
    let summary = assistant
        .summary(&mut session)
        .await
        .context("Summarization failed")?;

    println!("{}", summary);
    let stats = session.stats();
    println!(
        "\n({} words -> {} words in {:.2?})",
        stats.document_words,
        stats.summary_words,
        start.elapsed()
    );
    Ok(())
}

async fn cmd_ask(mode: Mode, document: PathBuf, question: String) -> Result<()> {
    let assistant = build(mode)?;
    let mut session = open(&assistant, &document)?;

    let outcome = assistant
        .ask(&mut session, mode, &question)
        .await
        .context("Question answering failed")?;

    println!("Answer: {}", outcome.answer);
    println!("Score:  {:.2}", outcome.score);
    if let Some(sentence) = outcome.justification {
        println!("Source: {}", sentence);
    }
    Ok(())
}

async fn cmd_quiz(mode: Mode, document: PathBuf) -> Result<()> {
    let assistant = build(mode)?;
    let mut session = open(&assistant, &document)?;

    let count = assistant
        .generate_quiz(&mut session, mode)
        .await
        .context("Question generation failed")?;

    if count == 0 {
        println!("No questions could be generated for this document.");
        return Ok(());
    }
    for (i, question) in session.quiz().questions().iter().enumerate() {
        println!("{:>2}. {}", i + 1, question);
    }
    Ok(())
}

async fn cmd_evaluate(mode: Mode, document: PathBuf, question: String, answer: String) -> Result<()> {
    let assistant = build(mode)?;
    let mut session = open(&assistant, &document)?;

    session.replace_quiz(vec![question]);
    let feedback = assistant
        .answer_quiz(&mut session, mode, 0, &answer)
        .await
        .context("Evaluation failed")?;

    println!("{}", feedback);
    Ok(())
}

async fn cmd_session(mode: Mode, document: PathBuf) -> Result<()> {
    let assistant = build(mode)?;
    let mut session = open(&assistant, &document)?;

    println!("Loaded {} ({} mode).", document.display(), mode);
    println!("Commands: ask <question> | summary | quiz | answer <n> <text> | stats | export <dir> | quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let (command, rest) = match line.trim().split_once(' ') {
            Some((c, r)) => (c.to_string(), r.trim().to_string()),
            None => (line.trim().to_string(), String::new()),
        };

        match command.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "ask" => match assistant.ask(&mut session, mode, &rest).await {
                Ok(outcome) => {
                    println!("{} (score {:.2})", outcome.answer, outcome.score);
                    if let Some(sentence) = outcome.justification {
                        println!("  from: {}", sentence);
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            "summary" => match assistant.summary(&mut session).await {
                Ok(summary) => println!("{}", summary),
                Err(e) => println!("Error: {}", e),
            },
            "quiz" => match assistant.generate_quiz(&mut session, mode).await {
                Ok(0) => println!("No questions could be generated."),
                Ok(_) => {
                    for (i, question) in session.quiz().questions().iter().enumerate() {
                        println!("{:>2}. {}", i + 1, question);
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            "answer" => {
                let Some((n, text)) = rest.split_once(' ') else {
                    println!("Usage: answer <n> <text>");
                    continue;
                };
                let Ok(n) = n.parse::<usize>() else {
                    println!("Question number must be a positive integer");
                    continue;
                };
                if n == 0 {
                    println!("Questions are numbered from 1");
                    continue;
                }
                match assistant.answer_quiz(&mut session, mode, n - 1, text).await {
                    Ok(feedback) => println!("{}", feedback),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "stats" => {
                let stats = session.stats();
                println!("  Questions asked: {}", stats.questions_asked);
                println!("  Document words:  {}", stats.document_words);
                println!("  Summary words:   {}", stats.summary_words);
                println!("  Quiz questions:  {}", stats.quiz_questions);
            }
            "export" => {
                let dir = if rest.is_empty() { PathBuf::from(".") } else { PathBuf::from(&rest) };
                for which in Export::ALL {
                    match session.export_to_dir(which, &dir) {
                        Ok(path) => println!("  wrote {}", path.display()),
                        Err(e) => println!("Error: {}", e),
                    }
                }
            }
            other => println!("Unknown command '{}'", other),
        }
    }

    Ok(())
}

async fn cmd_check() -> Result<()> {
    println!("Testing hosted model connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.remote.api_base);
    println!("  Model:     {}", config.remote.model);
    println!("  Key var:   {}", config.remote.api_key_env);
    println!();

    let client = match ChatClient::from_config(config.remote) {
        Ok(client) => client,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Ok(());
        }
    };

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => println!("Connection successful!"),
        Err(e) => println!("Connection failed: {}", e),
    }

    Ok(())
}
