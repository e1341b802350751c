//! CLI command implementations

use anyhow::Context;
use gitscribe_ai::providers::ollama::OllamaBackend;
use gitscribe_ai::{CommitAnalyzer, create_backend};
use gitscribe_core::{ChangeType, ResultCache, Settings};
use gitscribe_git::{ChangeScanner, DiffChunker, GitRepo};
use gitscribe_watcher::{GitPipeline, WatchLoop};
use std::path::PathBuf;
use std::sync::Arc;

async fn build_analyzer(settings: &Settings) -> anyhow::Result<CommitAnalyzer> {
    let model = match (settings.default_provider.as_str(), &settings.default_model) {
        ("ollama", None) => suggest_ollama_model().await,
        _ => settings.default_model.clone(),
    };
    let backend = create_backend(&settings.default_provider, model)?;
    Ok(CommitAnalyzer::new(backend, settings))
}

/// With no model configured, probe the local Ollama daemon and prefer one of
/// the models already installed over the hardcoded default.
async fn suggest_ollama_model() -> Option<String> {
    let probe = OllamaBackend::new(None);
    if !probe.is_available().await {
        tracing::warn!("Ollama daemon is not reachable at startup; generation calls will retry");
        return None;
    }
    match probe.suggest_model().await {
        Some(model) => {
            tracing::info!("Using installed Ollama model {}", model);
            Some(model)
        }
        None => {
            tracing::warn!("No models installed in Ollama; run `ollama pull` to add one");
            None
        }
    }
}

pub async fn watch(repo: PathBuf, settings: Settings) -> anyhow::Result<()> {
    let root = {
        let repo = GitRepo::discover(&repo)?;
        tracing::info!(
            "Watching {} (branch {})",
            repo.root().display(),
            repo.current_branch()
        );
        repo.root().to_path_buf()
    };

    let analyzer = build_analyzer(&settings).await?;
    tracing::info!("Using {} backend", analyzer.backend_name());

    let debounce = settings.debounce_delay;
    let ignore = settings.ignore_patterns.clone();
    let pipeline = Arc::new(GitPipeline::new(root.clone(), settings, analyzer));
    let handle = WatchLoop::new(pipeline, debounce, ignore).start(&root)?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    println!("\nStopping...");
    let stats = handle.stop().await;
    println!(
        "Session: {} analyses, {} errors, {} skipped",
        stats.passes, stats.errors, stats.skipped
    );
    Ok(())
}

pub async fn analyze(repo: PathBuf, settings: Settings) -> anyhow::Result<()> {
    let repo = GitRepo::discover(&repo)?;
    let changes = ChangeScanner::new(&repo, &settings).scan()?;
    if changes.is_empty() {
        println!("Working tree is clean; nothing to analyze.");
        return Ok(());
    }

    let chunks = DiffChunker::new(&repo, &settings).chunk(&changes);
    let analyzer = build_analyzer(&settings).await?;
    tracing::info!(
        "Generating commit message for {} chunks with {}",
        chunks.len(),
        analyzer.backend_name()
    );

    let message = analyzer.generate_commit_message(&chunks).await?;
    if message.is_empty() {
        anyhow::bail!("backend returned an empty commit message");
    }
    println!("\n=== Suggested Commit Message ===");
    println!("{message}");
    println!("================================");
    Ok(())
}

pub async fn review(
    repo: PathBuf,
    settings: Settings,
    path: Option<String>,
    kind: Option<String>,
) -> anyhow::Result<()> {
    let kind = kind.map(|k| parse_change_type(&k)).transpose()?;

    let repo = GitRepo::discover(&repo)?;
    let changes = ChangeScanner::new(&repo, &settings).scan()?;
    if changes.is_empty() {
        println!("Working tree is clean; nothing to review.");
        return Ok(());
    }

    let mut chunks = DiffChunker::new(&repo, &settings).chunk(&changes);
    if let Some(fragment) = &path {
        chunks.retain(|c| c.path.contains(fragment.as_str()));
    }
    if let Some(kind) = kind {
        chunks.retain(|c| c.change_type == kind);
    }
    if chunks.is_empty() {
        println!("No changes match the given filters.");
        return Ok(());
    }

    let analyzer = build_analyzer(&settings).await?;
    let reviews = analyzer.review_changes(&chunks).await?;
    if reviews.is_empty() {
        println!("Nothing reviewable in the current changes.");
        return Ok(());
    }
    for review in &reviews {
        println!("\n--- Review: {} ({}) ---", review.file, review.change_type);
        println!("{}", review.review);
    }
    Ok(())
}

pub fn cache_clear(settings: &Settings) -> anyhow::Result<()> {
    let cache = ResultCache::new(settings);
    let removed = cache.clear()?;
    println!(
        "Removed {} cached entries from {}",
        removed,
        cache.dir().display()
    );
    Ok(())
}

fn parse_change_type(raw: &str) -> anyhow::Result<ChangeType> {
    match raw.to_lowercase().as_str() {
        "added" => Ok(ChangeType::Added),
        "modified" => Ok(ChangeType::Modified),
        "deleted" => Ok(ChangeType::Deleted),
        "renamed" => Ok(ChangeType::Renamed),
        "untracked" => Ok(ChangeType::Untracked),
        other => anyhow::bail!(
            "unknown change type {:?} (expected added, modified, deleted, renamed, or untracked)",
            other
        ),
    }
}
