//! Git repository handle

use crate::error::{GitError, Result};
use git2::{DiffFormat, DiffOptions, Repository, Tree};
use std::path::{Path, PathBuf};

/// Per-path diff text plus whether git classified the content as binary.
#[derive(Debug, Default)]
pub struct DiffText {
    pub text: String,
    pub binary: bool,
}

/// Handle to a git working tree.
pub struct GitRepo {
    repo: Repository,
    root: PathBuf,
}

impl GitRepo {
    /// Discover and open the repository containing `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path)
            .map_err(|_| GitError::Repository(path.display().to_string()))?;
        let root = repo
            .workdir()
            .ok_or_else(|| GitError::Repository(format!("{} (bare)", path.display())))?
            .to_path_buf();
        tracing::debug!("Opened git repository at {}", root.display());
        Ok(Self { repo, root })
    }

    /// Working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn inner(&self) -> &Repository {
        &self.repo
    }

    /// Current branch name, or a detached-HEAD marker.
    pub fn current_branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(|s| s.to_string()))
            .unwrap_or_else(|| "HEAD (detached)".to_string())
    }

    /// Message of the last commit, if any commit exists.
    pub fn last_commit_message(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let commit = head.peel_to_commit().ok()?;
        commit.message().map(|m| m.trim().to_string())
    }

    /// HEAD tree, or `None` on an unborn branch (diffs then run against the
    /// empty tree).
    pub(crate) fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unified diff for one tracked path, HEAD through index to worktree,
    /// so staged and unstaged edits of the same file appear as one patch.
    pub(crate) fn diff_text_for_path(&self, path: &str) -> Result<DiffText> {
        let head_tree = self.head_tree()?;
        let mut opts = DiffOptions::new();
        opts.context_lines(3).pathspec(path);

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;

        let mut out = DiffText::default();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                'B' => out.binary = true,
                '+' | '-' | ' ' => {
                    out.text.push(line.origin());
                    out.text.push_str(&String::from_utf8_lossy(line.content()));
                }
                'F' | 'H' => {
                    out.text.push_str(&String::from_utf8_lossy(line.content()));
                }
                _ => {}
            }
            true
        })?;
        Ok(out)
    }
}
