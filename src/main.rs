use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use rag_responder::core::logging;
use rag_responder::{AppPaths, AppState, Outcome, StartupOptions};

/// Answer questions from the configured knowledge corpus.
#[derive(Debug, Parser)]
#[command(name = "rag-responder", version)]
struct Cli {
    /// Config file (defaults to config.yml in the data dir or project root)
    #[arg(long, env = "RAG_RESPONDER_CONFIG")]
    config: Option<PathBuf>,

    /// Number of passages to retrieve per question
    #[arg(long)]
    top_k: Option<usize>,

    /// Print retrieved passages to stderr
    #[arg(long)]
    show_context: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Question to answer; reads one question per line from stdin when omitted
    question: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, &cli.log_level);

    let options = StartupOptions {
        config_path: cli.config.clone(),
        top_k: cli.top_k,
    };
    let state = AppState::initialize(paths, options)
        .await
        .context("Failed to start responder")?;

    tracing::info!(
        "Ready (retrieval {}, top_k={})",
        if state.retriever.is_enabled() { "enabled" } else { "disabled" },
        state.config.retrieval.top_k
    );

    if !cli.question.is_empty() {
        let question = cli.question.join(" ");
        answer_one(&state, &question, cli.show_context).await?;
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        answer_one(&state, question, cli.show_context).await?;
    }

    Ok(())
}

async fn answer_one(state: &AppState, question: &str, show_context: bool) -> anyhow::Result<()> {
    let response = state.responder.respond(question).await;

    if show_context {
        if let Outcome::Grounded { passages } = &response.outcome {
            for passage in passages {
                eprintln!("[{} d={:.4}] {}", passage.id, passage.distance, passage.text);
            }
        }
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", response.text).context("Failed to write answer")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
