//! Diff chunking
//!
//! Expands a [`ChangeSet`] into size-bounded [`Chunk`]s. Tracked paths get a
//! combined HEAD-through-index-to-worktree patch, split first at logical unit
//! boundaries and only by raw size when that still overshoots. Untracked
//! files are streamed line by line so a large new file never has to fit in
//! memory as one string.

use crate::error::Result;
use crate::repo::GitRepo;
use gitscribe_core::{ChangeSet, ChangeType, Chunk, Settings, redact_content, redact_line};
use std::io::BufRead;

/// Below this many bytes a chunk is not worth emitting on its own, so unit
/// boundaries inside it do not trigger a split.
const MIN_USEFUL_CHUNK: usize = 100;

/// Line cap for streamed untracked files; everything past it is dropped and
/// marked with a truncation notice.
const MAX_UNTRACKED_LINES: usize = 10_000;

/// How many leading bytes to sniff for NUL when deciding binary vs text.
const BINARY_SNIFF_BYTES: usize = 1024;

/// Prefixes that open a logical unit in the languages we commonly see.
/// Matching is done after stripping the diff line origin marker.
pub struct UnitMarkers {
    markers: &'static [&'static str],
}

impl Default for UnitMarkers {
    fn default() -> Self {
        Self {
            markers: &[
                "def ", "class ", "function ", "func ", "const ", "let ", "var ", "public ",
                "private ", "protected ", "static ",
            ],
        }
    }
}

impl UnitMarkers {
    /// Whether a diff line opens a new logical unit.
    fn starts_unit(&self, line: &str) -> bool {
        let code = line
            .strip_prefix(['+', '-', ' '])
            .unwrap_or(line)
            .trim_start();
        self.markers.iter().any(|m| code.starts_with(m))
    }
}

pub struct DiffChunker<'a> {
    repo: &'a GitRepo,
    settings: &'a Settings,
    markers: UnitMarkers,
}

impl<'a> DiffChunker<'a> {
    pub fn new(repo: &'a GitRepo, settings: &'a Settings) -> Self {
        Self {
            repo,
            settings,
            markers: UnitMarkers::default(),
        }
    }

    /// Expand a change set into chunks. Failures are isolated per path: a
    /// file that cannot be read or diffed becomes a single flagged chunk and
    /// the rest of the batch proceeds.
    pub fn chunk(&self, changes: &ChangeSet) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (paths, change_type) in [
            (&changes.added, ChangeType::Added),
            (&changes.modified, ChangeType::Modified),
            (&changes.deleted, ChangeType::Deleted),
        ] {
            for path in paths {
                self.chunk_tracked(path, change_type, &mut chunks);
            }
        }

        for (old, new) in &changes.renamed {
            chunks.push(Chunk::renamed(old.clone(), new.clone()));
        }

        for path in &changes.untracked {
            match self.chunk_untracked(path) {
                Ok(untracked) => chunks.extend(untracked),
                Err(e) => {
                    tracing::warn!("Cannot read untracked file {}: {}", path, e);
                    chunks.push(Chunk::binary(ChangeType::Untracked, path.clone()));
                }
            }
        }

        tracing::debug!(
            "Expanded {} changed paths into {} chunks",
            changes.len(),
            chunks.len()
        );
        chunks
    }

    fn chunk_tracked(&self, path: &str, change_type: ChangeType, out: &mut Vec<Chunk>) {
        let diff = match self.repo.diff_text_for_path(path) {
            Ok(diff) => diff,
            Err(e) => {
                tracing::warn!("Cannot diff {}: {}", path, e);
                out.push(Chunk::binary(change_type, path.to_string()));
                return;
            }
        };
        if diff.binary || diff.text.is_empty() {
            out.push(Chunk::binary(change_type, path.to_string()));
            return;
        }

        let redacted = redact_content(&diff.text);
        for piece in self.split_diff(&redacted) {
            out.push(Chunk::new(change_type, path.to_string(), piece));
        }
    }

    /// Split a patch into pieces no longer than the configured max. The file
    /// header is repeated at the top of every piece so each one reads as a
    /// self-contained patch. A single line longer than the max stands alone
    /// in its own piece.
    fn split_diff(&self, text: &str) -> Vec<String> {
        let max = self.settings.max_chunk_size;
        if text.len() <= max {
            return vec![text.to_string()];
        }

        let header = diff_header(text);
        let body = &text[header.len()..];
        let mut pieces = Vec::new();
        let mut current = header.to_string();

        for line in body.lines() {
            let overflow = current.len() + line.len() + 1 > max;
            let boundary = self.markers.starts_unit(line)
                && current.len() >= header.len() + MIN_USEFUL_CHUNK;
            if (overflow || boundary) && current.len() > header.len() {
                pieces.push(std::mem::replace(&mut current, header.to_string()));
            }
            current.push_str(line);
            current.push('\n');
        }
        if current.len() > header.len() {
            pieces.push(current);
        }
        pieces
    }

    /// Stream an untracked file into added-line chunks. Checks, in order:
    /// path containment (symlinks pointing outside the tree are refused),
    /// the size ceiling, and a NUL sniff of the leading bytes.
    fn chunk_untracked(&self, path: &str) -> Result<Vec<Chunk>> {
        let file_err = |source| crate::error::GitError::FileAccess {
            path: path.to_string(),
            source,
        };
        let full = self.repo.root().join(path);

        let canonical = full.canonicalize().map_err(file_err)?;
        let root = self.repo.root().canonicalize().map_err(file_err)?;
        if !canonical.starts_with(&root) {
            tracing::warn!("Refusing to read {} (resolves outside the tree)", path);
            return Ok(vec![
                Chunk::new(ChangeType::Untracked, path.to_string(), "").with_security_blocked(),
            ]);
        }

        let meta = std::fs::metadata(&canonical).map_err(file_err)?;
        if meta.len() > self.settings.max_file_size_bytes() {
            return Ok(vec![
                Chunk::new(ChangeType::Untracked, path.to_string(), "").with_size_exceeded(),
            ]);
        }

        let file = std::fs::File::open(&canonical).map_err(file_err)?;
        let mut reader = std::io::BufReader::new(file);

        let sniff = reader.fill_buf().map_err(file_err)?;
        if sniff[..sniff.len().min(BINARY_SNIFF_BYTES)].contains(&0) {
            return Ok(vec![Chunk::binary(ChangeType::Untracked, path.to_string())]);
        }

        let max = self.settings.max_chunk_size;
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut raw = Vec::new();
        let mut lines = 0usize;

        loop {
            raw.clear();
            let n = reader.read_until(b'\n', &mut raw).map_err(file_err)?;
            if n == 0 {
                break;
            }
            lines += 1;
            if lines > MAX_UNTRACKED_LINES {
                current.push_str(&format!(
                    "... (truncated: file exceeds {} lines)\n",
                    MAX_UNTRACKED_LINES
                ));
                break;
            }

            let text = String::from_utf8_lossy(&raw);
            let line = redact_line(text.trim_end_matches(['\n', '\r']));
            if current.len() + line.len() + 2 > max && !current.is_empty() {
                chunks.push(Chunk::new(
                    ChangeType::Untracked,
                    path.to_string(),
                    std::mem::take(&mut current),
                ));
            }
            current.push('+');
            current.push_str(&line);
            current.push('\n');
        }
        if !current.is_empty() {
            chunks.push(Chunk::new(ChangeType::Untracked, path.to_string(), current));
        }
        if chunks.is_empty() {
            // Zero-byte file still deserves a presence marker.
            chunks.push(Chunk::new(
                ChangeType::Untracked,
                path.to_string(),
                format!("New empty file: {}", path),
            ));
        }
        Ok(chunks)
    }
}

/// Everything before the first hunk marker; repeated on continuation pieces.
fn diff_header(text: &str) -> &str {
    match text.find("@@") {
        Some(idx) => {
            let start = text[..idx].rfind('\n').map(|i| i + 1).unwrap_or(0);
            &text[..start]
        }
        None => "",
    }
}
