//! Change-set and chunk model

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a path differs from the last committed state. Every path in a change
/// set belongs to exactly one category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
    Untracked,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeType::Added => "added",
            ChangeType::Modified => "modified",
            ChangeType::Deleted => "deleted",
            ChangeType::Renamed => "renamed",
            ChangeType::Untracked => "untracked",
        };
        f.write_str(s)
    }
}

/// Snapshot of every changed path in the working tree, staged and unstaged
/// merged. Recomputed fresh on every scan and sorted for reproducibility.
///
/// A path staged as `Added` and then modified again in the worktree reports
/// as `Modified` only; it never appears in both categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<(String, String)>,
    pub untracked: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
            && self.untracked.is_empty()
    }

    /// Total number of changed paths across all categories.
    pub fn len(&self) -> usize {
        self.added.len()
            + self.modified.len()
            + self.deleted.len()
            + self.renamed.len()
            + self.untracked.len()
    }

    /// Sort every category lexicographically. Scanners call this before
    /// returning so identical tree states always produce identical output.
    pub fn sort(&mut self) {
        self.added.sort();
        self.modified.sort();
        self.deleted.sort();
        self.renamed.sort();
        self.untracked.sort();
    }
}

/// A size-bounded unit of change content handed to the generation backend.
///
/// `content` never exceeds the configured max chunk size, except for the
/// terminal remainder of a streamed file which is flushed at end of stream.
/// Renamed chunks carry `old_path`/`new_path` and a synthetic description
/// instead of a diff body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub change_type: ChangeType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub binary: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub security_blocked: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub size_exceeded: bool,
}

impl Chunk {
    pub fn new(change_type: ChangeType, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            change_type,
            path: path.into(),
            old_path: None,
            new_path: None,
            content: content.into(),
            binary: false,
            security_blocked: false,
            size_exceeded: false,
        }
    }

    /// Synthetic chunk describing a rename; no content inspection happens.
    pub fn renamed(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        let old_path = old_path.into();
        let new_path = new_path.into();
        let mut chunk = Chunk::new(
            ChangeType::Renamed,
            new_path.clone(),
            format!("File renamed: {} -> {}", old_path, new_path),
        );
        chunk.old_path = Some(old_path);
        chunk.new_path = Some(new_path);
        chunk
    }

    pub fn binary(change_type: ChangeType, path: impl Into<String>) -> Self {
        let mut chunk = Chunk::new(change_type, path, "");
        chunk.binary = true;
        chunk
    }

    pub fn with_size_exceeded(mut self) -> Self {
        self.size_exceeded = true;
        self
    }

    pub fn with_security_blocked(mut self) -> Self {
        self.security_blocked = true;
        self
    }
}

/// Canonical serialization of a chunk set, used as the cache key payload.
/// serde_json emits struct fields in declaration order, so equal chunk sets
/// always serialize identically.
pub fn canonical_payload(chunks: &[Chunk]) -> String {
    serde_json::to_string(chunks).unwrap_or_default()
}
