//! Gitscribe CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "gitscribe")]
#[command(about = "AI-assisted commit messages and code review for git working trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Repository path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,

    /// Generation backend: ollama, openrouter, or gemini
    #[arg(short, long)]
    provider: Option<String>,

    /// Model name override for the chosen backend
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the repository and analyze each burst of changes
    Watch,
    /// Analyze current changes once and print a commit message
    Analyze,
    /// Review current changes and print per-file feedback
    Review {
        /// Only review chunks whose path contains this fragment
        #[arg(long)]
        path: Option<String>,

        /// Only review one change kind (added, modified, untracked, ...)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete every cached analysis result
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = [
        "gitscribe",
        "gitscribe_core",
        "gitscribe_git",
        "gitscribe_ai",
        "gitscribe_watcher",
    ]
    .map(|target| format!("{target}={log_level}"))
    .join(",");
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = gitscribe_core::Settings::from_env();
    if let Some(provider) = cli.provider {
        settings.default_provider = provider;
    }
    if let Some(model) = cli.model {
        settings.default_model = Some(model);
    }

    match cli.command {
        Commands::Watch => commands::watch(cli.repo, settings).await,
        Commands::Analyze => commands::analyze(cli.repo, settings).await,
        Commands::Review { path, kind } => commands::review(cli.repo, settings, path, kind).await,
        Commands::Cache {
            action: CacheAction::Clear,
        } => commands::cache_clear(&settings),
        Commands::Version => {
            println!("gitscribe v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
