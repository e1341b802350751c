//! Change-set fingerprinting for debounce and dedup decisions

use crate::change::ChangeSet;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hash summarizing the current change set. Two scans of an identical
/// on-disk state produce the same fingerprint; any size or mtime delta
/// changes it. Used only as a dedup token, never shown to backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFingerprint(String);

impl ChangeFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

/// Compute a fingerprint over `(change_type, path, size, mtime)` records,
/// sorted deterministically before hashing. Paths that cannot be stat'ed
/// (deleted mid-scan, permission change) hash with size 0 and mtime 0.
pub fn fingerprint_change_set(root: &Path, changes: &ChangeSet) -> ChangeFingerprint {
    let mut records: Vec<String> = Vec::with_capacity(changes.len());

    for path in &changes.added {
        records.push(stat_record("added", root, path));
    }
    for path in &changes.modified {
        records.push(stat_record("modified", root, path));
    }
    for path in &changes.untracked {
        records.push(stat_record("untracked", root, path));
    }
    for path in &changes.deleted {
        records.push(format!("deleted\t{}\t0\t0", path));
    }
    for (old, new) in &changes.renamed {
        records.push(format!("renamed\t{}\t{}\t0", old, new));
    }

    records.sort();

    let mut hasher = Sha256::new();
    for record in &records {
        hasher.update(record.as_bytes());
        hasher.update(b"\n");
    }
    ChangeFingerprint(format!("{:x}", hasher.finalize()))
}

fn stat_record(kind: &str, root: &Path, rel_path: &str) -> String {
    let (size, mtime_nanos) = match std::fs::metadata(root.join(rel_path)) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            (meta.len(), mtime)
        }
        Err(_) => (0, 0),
    };
    format!("{}\t{}\t{}\t{}", kind, rel_path, size, mtime_nanos)
}
