//! Operator CLI running the ingestion, answer and wipe flows without the HTTP server.
//!
//! Shares configuration and backends with the `pdfchat` binary, so a document ingested here is
//! visible to the web UI under the same session id.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use pdfchat::{
    config, logging,
    processing::{ChatEvent, ProcessingService, sanitize_message, sanitize_session_id},
};
use std::{io::Write, path::PathBuf};

#[derive(Parser)]
#[command(
    name = "pdfchat-cli",
    about = "Ingest PDFs, ask grounded questions, and wipe chat sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a PDF into a session.
    Ingest {
        #[arg(long)]
        session: String,
        file: PathBuf,
    },
    /// Ask a question against a session's document.
    Ask {
        #[arg(long)]
        session: String,
        question: String,
    },
    /// Delete every chunk stored for a session.
    Wipe {
        #[arg(long)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing(config::get_config().log_file.as_deref());
    let service = ProcessingService::new();

    match cli.command {
        Command::Ingest { session, file } => {
            let session = sanitize_session_id(Some(session))?;
            let document = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let outcome = service.ingest_document(&session, document).await?;
            println!(
                "Indexed {} chunks into session {session} ({} dropped)",
                outcome.chunks_indexed, outcome.chunks_failed
            );
        }
        Command::Ask { session, question } => {
            let session = sanitize_session_id(Some(session))?;
            let question = sanitize_message(Some(question))?;
            let mut events = service.answer(&session, question).await?;
            let mut stdout = std::io::stdout();
            let mut failure = None;

            while let Some(event) = events.next().await {
                match event {
                    ChatEvent::Citations { citations } => {
                        for (index, citation) in citations.iter().enumerate() {
                            println!("[{}] {citation}", index + 1);
                        }
                        println!();
                    }
                    ChatEvent::Text { text } => {
                        print!("{text}");
                        stdout.flush().context("failed to flush stdout")?;
                    }
                    ChatEvent::Error { message } => failure = Some(message),
                    ChatEvent::Done => println!(),
                }
            }

            if let Some(message) = failure {
                bail!("answer stream failed: {message}");
            }
        }
        Command::Wipe { session } => {
            let session = sanitize_session_id(Some(session))?;
            let deleted = service.wipe_session(&session).await?;
            println!("Nuclear Wipe Complete ({deleted} chunks removed from {session})");
        }
    }

    Ok(())
}
