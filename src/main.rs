//! # Konspekt CLI (`konspekt`)
//!
//! Ask questions about your study notes. Documents are split into
//! overlapping fragments, embedded, and stored in a local index; answers are
//! the most relevant fragments with page and file citations.
//!
//! ## Usage
//!
//! ```bash
//! konspekt [--config ./konspekt.toml] [-v] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `konspekt ingest <path>...` | Add documents (or directories of documents) |
//! | `konspekt ask "<question>"` | Print the most relevant fragments |
//! | `konspekt stats` | Show what is indexed |
//! | `konspekt clear` | Delete the index |
//! | `konspekt chat` | Interactive question loop |
//! | `konspekt serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! konspekt ingest lectures/biology.pdf notes/
//! konspekt ask "What does the mitochondria do?" -k 5
//! konspekt ask "Define osmosis" --json | jq '.results[0].fragment.page'
//! konspekt clear --yes
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use konspekt::errors::describe_error;
use konspekt::{chat, clear, config, ingest, search, server, stats};

/// Konspekt: question answering over your study notes.
///
/// Settings are read from `--config`, else `./konspekt.toml` if it exists,
/// else built-in defaults.
#[derive(Parser)]
#[command(
    name = "konspekt",
    about = "Konspekt — question answering over your study notes",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr (same as RUST_LOG=info).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add documents to the index.
    ///
    /// Accepts PDF, plain text / Markdown, DOCX and PPTX files. A directory
    /// adds every supported file directly inside it.
    Ingest {
        /// Documents or directories, ingested in order.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ask a question and print the most relevant fragments.
    Ask {
        /// The question.
        question: String,

        /// Number of fragments to return (default: `retrieval.k`).
        #[arg(short)]
        k: Option<usize>,

        /// Print results as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics.
    Stats,

    /// Delete the index directory.
    Clear {
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Interactive loop: type questions, `:ingest <path>`, `:stats`, `:clear`, `:quit`.
    Chat,

    /// Start the HTTP server on `server.bind`.
    Serve,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest { paths } => ingest::run_ingest(&cfg, &paths)?,
        Commands::Ask { question, k, json } => search::run_ask(&cfg, &question, k, json)?,
        Commands::Stats => stats::run_stats(&cfg)?,
        Commands::Clear { yes } => clear::run_clear(&cfg, yes)?,
        Commands::Chat => chat::run_chat(&cfg)?,
        Commands::Serve => server::run_server(&cfg).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("Error: {}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}
