//! conflictfix command-line tool.
//!
//! Resolves the Git merge conflicts in one file by sending it to a hosted
//! LLM and overwriting it with the reply.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conflictfix_core::config::ResolverConfig;
use conflictfix_core::llm::build_generator;
use conflictfix_core::resolver::{read_target, ConflictResolver, RequestSettings, ResolveOutcome};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Resolve Git merge conflicts in a file with an LLM, in place.
#[derive(Parser, Debug)]
#[command(name = "conflictfix", version, about)]
struct Cli {
    /// File containing merge conflict markers. It is overwritten in place.
    file: PathBuf,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ResolverConfig::load_and_resolve(cli.config.as_ref())
        .context("failed to load configuration")?;

    // An unreadable file is reported ahead of any client setup problem.
    let content = read_target(&cli.file)
        .await
        .with_context(|| format!("failed to resolve {}", cli.file.display()))?;

    let generator = build_generator(&config.llm).context("failed to set up LLM client")?;
    let resolver = ConflictResolver::new(generator, RequestSettings::from(&config.llm));

    let outcome = resolver
        .resolve_content(&cli.file, &content)
        .await
        .with_context(|| format!("failed to resolve {}", cli.file.display()))?;

    match outcome {
        ResolveOutcome::Rewritten { path, bytes } => {
            info!(path = %path.display(), bytes, "resolved");
        }
        ResolveOutcome::Unchanged { path, reason } => {
            info!(path = %path.display(), %reason, "left unchanged");
        }
    }

    Ok(())
}
