//! Analysis pipeline driven by the watch loop

use anyhow::Result;
use async_trait::async_trait;
use gitscribe_ai::CommitAnalyzer;
use gitscribe_core::{ChangeFingerprint, Settings, fingerprint_change_set};
use gitscribe_git::{ChangeScanner, DiffChunker, GitRepo};
use std::path::PathBuf;

/// One analysis pass over the working tree. The watch loop only decides
/// WHEN to run; everything about WHAT a pass does lives behind this trait,
/// which also keeps the loop testable without a repository or a model.
#[async_trait]
pub trait ChangePipeline: Send + Sync {
    /// Fingerprint of the current change set, or `None` when the tree is
    /// clean. Used to suppress passes over unchanged state.
    fn fingerprint(&self) -> Result<Option<ChangeFingerprint>>;

    /// Run a full scan-chunk-generate pass and present the result.
    async fn analyze(&self) -> Result<()>;
}

/// The real pipeline: scan the repository, chunk the diff, generate a
/// commit message (and optionally reviews), print the result.
///
/// A fresh repository handle is opened per call; the git handle is not
/// `Sync` and a pass is rare enough that reopening costs nothing
/// noticeable.
pub struct GitPipeline {
    repo_path: PathBuf,
    settings: Settings,
    analyzer: CommitAnalyzer,
}

impl GitPipeline {
    pub fn new(repo_path: impl Into<PathBuf>, settings: Settings, analyzer: CommitAnalyzer) -> Self {
        Self {
            repo_path: repo_path.into(),
            settings,
            analyzer,
        }
    }
}

#[async_trait]
impl ChangePipeline for GitPipeline {
    fn fingerprint(&self) -> Result<Option<ChangeFingerprint>> {
        let repo = GitRepo::discover(&self.repo_path)?;
        let changes = ChangeScanner::new(&repo, &self.settings).scan()?;
        if changes.is_empty() {
            return Ok(None);
        }
        Ok(Some(fingerprint_change_set(repo.root(), &changes)))
    }

    async fn analyze(&self) -> Result<()> {
        let repo = GitRepo::discover(&self.repo_path)?;
        let changes = ChangeScanner::new(&repo, &self.settings).scan()?;
        if changes.is_empty() {
            tracing::info!("Working tree is clean; nothing to analyze");
            return Ok(());
        }

        let chunks = DiffChunker::new(&repo, &self.settings).chunk(&changes);
        if chunks.is_empty() {
            tracing::info!("No analyzable content in {} changed paths", changes.len());
            return Ok(());
        }

        tracing::info!(
            "Analyzing {} changed paths on branch {}",
            changes.len(),
            repo.current_branch()
        );
        let message = self.analyzer.generate_commit_message(&chunks).await?;

        println!("\n=== Suggested Commit Message ===");
        println!("{message}");
        println!("================================\n");

        if self.settings.auto_review {
            let reviews = self.analyzer.review_changes(&chunks).await?;
            for review in &reviews {
                println!("--- Review: {} ({}) ---", review.file, review.change_type);
                println!("{}\n", review.review);
            }
        }
        Ok(())
    }
}
