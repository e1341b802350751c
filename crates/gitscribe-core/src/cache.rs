//! Content-addressed result cache with TTL expiry
//!
//! One file per entry under the cache directory, named by the hash of its
//! input. The cache is a pure optimization layer: lookups and writes must
//! never fail the caller, so the public `get`/`set` surface logs and
//! discards every error from the `Result`-returning internals. Writes go
//! through a temp file plus rename so a killed process never leaves a
//! half-written entry that later reads as valid, and so independent
//! processes writing the same key converge instead of corrupting each other.

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
    value: String,
}

/// File-backed cache mapping `(namespace, payload)` to a generated string.
pub struct ResultCache {
    dir: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl ResultCache {
    pub fn new(settings: &Settings) -> Self {
        Self {
            dir: settings.cache_dir.clone(),
            ttl: settings.cache_ttl,
            enabled: settings.cache_enabled,
        }
    }

    pub fn with_dir(dir: impl Into<PathBuf>, ttl: Duration, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            enabled,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Look up a previously generated value. Returns `None` when the cache
    /// is disabled, the entry does not exist, is expired, or is unreadable.
    pub fn get(&self, namespace: &str, payload: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match self.read_entry(namespace, payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Cache read failed for {}: {}", namespace, e);
                None
            }
        }
    }

    /// Store a generated value. Best-effort: storage failures are logged
    /// and swallowed.
    pub fn set(&self, namespace: &str, payload: &str, value: &str) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.write_entry(namespace, payload, value) {
            tracing::debug!("Cache write failed for {}: {}", namespace, e);
        }
    }

    /// Remove every cache entry. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json")
                && std::fs::remove_file(&path).is_ok()
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn key(namespace: &str, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update(b"\0");
        hasher.update(payload.as_bytes());
        format!("{}_{:x}", namespace, hasher.finalize())
    }

    fn entry_path(&self, namespace: &str, payload: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(namespace, payload)))
    }

    fn read_entry(&self, namespace: &str, payload: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(namespace, payload);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let entry: CacheFile = serde_json::from_str(&raw)?;

        let age_ms = chrono::Utc::now()
            .timestamp_millis()
            .saturating_sub(entry.timestamp);
        if age_ms > self.ttl.as_millis() as i64 {
            // Lazy eviction: an expired entry reads as absent.
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn write_entry(&self, namespace: &str, payload: &str, value: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(namespace, payload);
        let entry = CacheFile {
            timestamp: chrono::Utc::now().timestamp_millis(),
            value: value.to_string(),
        };
        let json = serde_json::to_string(&entry)?;

        // Write-then-rename keeps entries atomic under concurrent writers;
        // the temp name is per-process so two writers never interleave.
        let tmp = path.with_extension(format!("json.tmp{}", std::process::id()));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
