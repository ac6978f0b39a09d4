//! # local-chat
//!
//! Command-line front end for a local assistant backed by Ollama,
//! AUTOMATIC1111, whisper.cpp and Chroma.
//!
//! ```bash
//! local-chat ask "What is ownership in Rust?"
//! local-chat ask "Create an image of a red fox in snow"
//! local-chat image a lighthouse at dusk
//! local-chat dictate --ask            # needs `--features speech`
//! local-chat ingest ./paper.pdf
//! local-chat health --json
//! ```
//!
//! Configuration comes from the environment, optionally seeded from `.env`.
//! Ctrl+C cancels the running request.

mod telemetry;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use orchestrator::{AppConfig, AppError, AskOutcome, Assistant, DictationOutcome, HealthStatus};
use tracing::{debug, info};

const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "local-chat",
    version,
    about = "Chat, image generation, dictation and PDF ingestion against local AI services"
)]
struct Cli {
    /// Debug logging for all workspace crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a prompt. Prompts asking for a picture are routed to Stable Diffusion.
    Ask {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Wait for the complete answer instead of streaming it.
        #[arg(long)]
        no_stream: bool,
    },

    /// Generate an image from the prompt.
    Image {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Record from the default microphone and print the transcription.
    Dictate {
        /// Send the transcription to the model as a prompt.
        #[arg(long)]
        ask: bool,
    },

    /// Extract, chunk, embed and store a PDF in the Chroma collection.
    Ingest { pdf: PathBuf },

    /// Probe Ollama, Stable Diffusion and Chroma.
    Health {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();
    telemetry::init(cli.verbose);
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => debug!("no .env file"),
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let assistant = match build(cli.verbose) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let on_interrupt = Arc::clone(&assistant);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            if !on_interrupt.cancel_active() {
                // Nothing cancellable is running (e.g. health probes).
                eprintln!("\n{}", "Cancelled.".yellow());
                std::process::exit(i32::from(EXIT_CANCELLED));
            }
        }
    });

    match run(&assistant, cli.command).await {
        Ok(code) => code,
        Err(e) if e.is_cancelled() => {
            eprintln!("\n{}", e.user_message().yellow());
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            debug!(class = ?e.class(), error = ?e, "command failed");
            eprintln!("{}", e.user_message().red());
            ExitCode::FAILURE
        }
    }
}

fn build(verbose: bool) -> anyhow::Result<Assistant> {
    let cfg = AppConfig::from_env()
        .context("invalid configuration")?
        .with_progress(io::stderr().is_terminal());
    if verbose {
        debug!(?cfg, "configuration");
    }

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(AppError::HttpClient)?;

    Assistant::new(client, cfg).context("failed to initialise services")
}

async fn run(assistant: &Assistant, command: Command) -> Result<ExitCode, AppError> {
    match command {
        Command::Ask { prompt, no_stream } => {
            ask(assistant, &prompt.join(" "), !no_stream).await?;
        }
        Command::Image { prompt } => {
            let path = assistant.imagine(&prompt.join(" ")).await?;
            print_image(&path);
        }
        Command::Dictate { ask: then_ask } => {
            eprintln!("{}", "Listening...".dimmed());
            match assistant.dictate().await? {
                DictationOutcome::NoSpeech => {
                    eprintln!("{}", "No speech detected.".yellow());
                }
                DictationOutcome::Transcribed(text) => {
                    println!("{text}");
                    if then_ask {
                        ask(assistant, &text, true).await?;
                    }
                }
            }
        }
        Command::Ingest { pdf } => {
            let result = assistant.ingest_pdf(&pdf).await?;
            eprintln!(
                "{} {} chunk(s) from {} into collection `{}`",
                "Ingested".green().bold(),
                result.chunks_stored,
                result.file_name,
                result.collection_name
            );
        }
        Command::Health { json } => {
            let report = assistant.health().await;
            if json {
                let rendered = serde_json::to_string_pretty(&report)
                    .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
                println!("{rendered}");
            } else {
                report.iter().for_each(print_health);
            }
            if report.iter().any(|s| !s.ok) {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn ask(assistant: &Assistant, prompt: &str, stream: bool) -> Result<(), AppError> {
    let outcome = if stream {
        assistant
            .ask(prompt, |fragment| {
                let mut out = io::stdout();
                let _ = out.write_all(fragment.as_bytes());
                let _ = out.flush();
            })
            .await?
    } else {
        assistant.ask_once(prompt).await?
    };

    match outcome {
        AskOutcome::Text { text, stats } => {
            if stream {
                println!();
            } else {
                println!("{text}");
            }
            eprintln!(
                "{}",
                format!(
                    "[{} chars in {:.1}s, {:.0} chars/s]",
                    stats.chars,
                    stats.elapsed.as_secs_f64(),
                    stats.chars_per_sec
                )
                .dimmed()
            );
        }
        AskOutcome::Image { path } => print_image(&path),
    }
    Ok(())
}

fn print_image(path: &std::path::Path) {
    eprintln!("{}", "Image saved:".green().bold());
    println!("{}", path.display());
}

fn print_health(status: &HealthStatus) {
    let mark = if status.ok { "ok".green().bold() } else { "down".red().bold() };
    let model = status
        .model
        .as_deref()
        .map(|m| format!(" [{m}]"))
        .unwrap_or_default();
    println!(
        "{:<16} {:<5} {}{} ({} ms) {}",
        status.backend,
        mark,
        status.endpoint,
        model,
        status.latency_ms,
        status.message.dimmed()
    );
}
