//! Working-tree change scanning

use crate::error::Result;
use crate::repo::GitRepo;
use git2::StatusOptions;
use gitscribe_core::{ChangeSet, Settings};

/// Classifies every staged, unstaged, and untracked path into one
/// [`ChangeSet`] category, applying the ignore-pattern and file-size filters
/// before inclusion.
pub struct ChangeScanner<'a> {
    repo: &'a GitRepo,
    settings: &'a Settings,
}

impl<'a> ChangeScanner<'a> {
    pub fn new(repo: &'a GitRepo, settings: &'a Settings) -> Self {
        Self { repo, settings }
    }

    /// Snapshot the current change set. Staged and unstaged deltas merge
    /// under the collapse rule: a path staged as added and then modified
    /// again in the worktree reports as `Modified` only. Output is sorted
    /// so identical tree states always scan identically.
    pub fn scan(&self) -> Result<ChangeSet> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .renames_head_to_index(true)
            .renames_index_to_workdir(true);

        let statuses = self.repo.inner().statuses(Some(&mut opts))?;
        let mut changes = ChangeSet::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_index_renamed() || status.is_wt_renamed() {
                let delta = entry.head_to_index().or_else(|| entry.index_to_workdir());
                if let Some(delta) = delta {
                    let old = delta
                        .old_file()
                        .path()
                        .map(|p| p.to_string_lossy().to_string());
                    let new = delta
                        .new_file()
                        .path()
                        .map(|p| p.to_string_lossy().to_string());
                    if let (Some(old), Some(new)) = (old, new) {
                        // Either side matching a filter drops the rename,
                        // same as the single-path categories.
                        if self.should_skip(&old) || self.should_skip(&new) {
                            continue;
                        }
                        changes.renamed.push((old, new));
                    }
                }
                continue;
            }

            let Some(path) = entry.path().map(|p| p.to_string()) else {
                // Non-UTF-8 path; nothing downstream can render it.
                continue;
            };
            if self.should_skip(&path) {
                continue;
            }

            if status.is_index_deleted() || status.is_wt_deleted() {
                changes.deleted.push(path);
            } else if status.is_index_new() {
                if status.is_wt_modified() {
                    // Added then modified collapses to Modified.
                    changes.modified.push(path);
                } else {
                    changes.added.push(path);
                }
            } else if status.is_index_modified()
                || status.is_wt_modified()
                || status.is_index_typechange()
                || status.is_wt_typechange()
            {
                changes.modified.push(path);
            } else if status.is_wt_new() {
                changes.untracked.push(path);
            }
        }

        changes.sort();
        changes.added.dedup();
        changes.modified.dedup();
        changes.deleted.dedup();
        changes.renamed.dedup();
        changes.untracked.dedup();
        Ok(changes)
    }

    /// Ignore-pattern substring match plus the whole-file size ceiling.
    /// Oversized files are dropped entirely so downstream never sees them.
    fn should_skip(&self, path: &str) -> bool {
        if self
            .settings
            .ignore_patterns
            .iter()
            .any(|pattern| path.contains(pattern.as_str()))
        {
            return true;
        }

        let full = self.repo.root().join(path);
        if let Ok(meta) = std::fs::metadata(&full)
            && meta.is_file()
            && meta.len() > self.settings.max_file_size_bytes()
        {
            tracing::debug!(
                "Skipping {} ({} bytes over the {} MB ceiling)",
                path,
                meta.len(),
                self.settings.max_file_size_mb
            );
            return true;
        }
        false
    }
}
