//! CLI parser and command dispatch.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use papermark::config::Config;

#[derive(Parser)]
#[command(name = "papermark")]
#[command(about = "Classify research-paper sentences and highlight them in the PDF")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Classify sentences in contextual batches with a generative LLM
    Llm {
        /// Input PDF
        pdf: PathBuf,
        /// Output PDF (default: <stem>_annotated_llm.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sentences per batch (default from config: 4)
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// LLM endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,
        /// Model name (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// Also write the reconciled annotations as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Classify each sentence independently with a zero-shot scorer
    #[command(name = "zero-shot")]
    ZeroShot {
        /// Input PDF
        pdf: PathBuf,
        /// Output PDF (default: <stem>_sentence_annotated.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sentences per batch (default from config: 32)
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Embedding model (overrides config)
        #[arg(long)]
        model: Option<String>,
        /// Also write the reconciled annotations as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print the extracted sentence stream as JSON lines
    Extract {
        /// Input PDF
        pdf: PathBuf,
    },

    /// Show the category taxonomy and highlight colors
    Labels,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => {
            let path = papermark::config::expand_path(&path.to_string_lossy());
            Config::load_from_path(&path).await?
        }
        None => Config::load().await,
    };

    match cli.command {
        Commands::Llm {
            pdf,
            output,
            batch_size,
            endpoint,
            model,
            json,
        } => {
            commands::cmd_llm(
                &config,
                &pdf,
                output,
                batch_size,
                endpoint,
                model,
                json,
            )
            .await
        }
        Commands::ZeroShot {
            pdf,
            output,
            batch_size,
            model,
            json,
        } => commands::cmd_zero_shot(&config, &pdf, output, batch_size, model, json).await,
        Commands::Extract { pdf } => commands::cmd_extract(&config, &pdf).await,
        Commands::Labels => commands::cmd_labels(&config),
    }
}
