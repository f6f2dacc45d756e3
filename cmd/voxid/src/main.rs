//! voxid - speaker identification pipeline CLI.
//!
//! The process-level entry point for the training and inference pipeline:
//! results come back as structured output (JSON on stdout, logs on
//! stderr), never as text to be scraped.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Speaker identification: train classical ML models on enrolled speakers
/// and predict who is talking.
#[derive(Parser, Debug)]
#[command(name = "voxid")]
#[command(about = "Speaker identification pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a speaker model from per-speaker audio directories.
    Train(commands::train::Args),
    /// Predict the top-k speakers for an audio clip.
    Predict(commands::predict::Args),
    /// Audio statistics and feature shape for a clip.
    Stats(commands::stats::Args),
    /// List loaded models, their metrics, and the current best model.
    Models(commands::models::Args),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Train(args) => commands::train::run(args),
        Command::Predict(args) => commands::predict::run(args),
        Command::Stats(args) => commands::stats::run(args),
        Command::Models(args) => commands::models::run(args),
    }
}
