//! Codehint CLI - hints about highlighted code from a local model.

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use std::path::PathBuf;

mod commands;
mod snippets;

/// Codehint - ask a local model for a hint about a piece of code
#[derive(Parser)]
#[command(name = "codehint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a hint for highlighted code
    Hint {
        /// Source file (omit with --example)
        file: Option<PathBuf>,
        /// Text to get a hint about
        #[arg(long)]
        highlight: Option<String>,
        /// Line range to get a hint about, e.g. `4` or `3-5`
        #[arg(long, conflicts_with = "highlight")]
        lines: Option<String>,
        /// Use a built-in example snippet instead of a file
        #[arg(long, conflicts_with = "file")]
        example: Option<usize>,
        /// Model id (default: smallest available)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List available and installed models
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a model, or install one from a local .gguf file
    Pull {
        /// Model id (default: smallest available)
        #[arg(short, long)]
        model: Option<String>,
        /// Install from this file instead of downloading
        #[arg(long, conflicts_with = "model")]
        path: Option<PathBuf>,
    },

    /// List example snippets, or print one
    Examples {
        /// Example number
        index: Option<usize>,
    },

    /// Delete all downloaded models
    ClearCache,

    /// Show paths and defaults
    Info,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    match cli.command {
        Commands::Hint {
            file,
            highlight,
            lines,
            example,
            model,
        } => {
            let args = commands::hint::HintArgs {
                file,
                highlight,
                lines,
                example,
                model,
            };
            runtime()?.block_on(commands::hint::run(args))
        }
        Commands::Models { json } => commands::model::list(json),
        Commands::Pull { model, path } => {
            runtime()?.block_on(commands::model::pull(model.as_deref(), path.as_deref()))
        }
        Commands::Examples { index } => commands::examples::run(index),
        Commands::ClearCache => runtime()?.block_on(commands::model::clear_cache()),
        Commands::Info => commands::info::run(),
    }
}

fn runtime() -> miette::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().into_diagnostic()
}
