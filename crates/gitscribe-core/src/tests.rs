//! Unit tests for gitscribe-core

use crate::cache::ResultCache;
use crate::change::{ChangeSet, ChangeType, Chunk, canonical_payload};
use crate::fingerprint::fingerprint_change_set;
use crate::redact::{REDACTED_LINE, redact_content, redact_line};
use crate::settings::Settings;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.max_chunk_size, 2000);
    assert_eq!(settings.debounce_delay, Duration::from_secs(3));
    assert!(settings.cache_enabled);
    assert!(!settings.auto_review);
    assert!(settings.ignore_patterns.iter().any(|p| p == ".git/"));
    assert_eq!(settings.max_file_size_bytes(), 5 * 1024 * 1024);
}

#[test]
fn test_change_set_sorting_and_len() {
    let mut changes = ChangeSet {
        modified: vec!["zz.rs".to_string(), "aa.rs".to_string()],
        untracked: vec!["new.txt".to_string()],
        ..Default::default()
    };
    changes.sort();
    assert_eq!(changes.modified, vec!["aa.rs", "zz.rs"]);
    assert_eq!(changes.len(), 3);
    assert!(!changes.is_empty());
    assert!(ChangeSet::default().is_empty());
}

#[test]
fn test_rename_chunk_shape() {
    let chunk = Chunk::renamed("old.rs", "new.rs");
    assert_eq!(chunk.change_type, ChangeType::Renamed);
    assert_eq!(chunk.old_path.as_deref(), Some("old.rs"));
    assert_eq!(chunk.new_path.as_deref(), Some("new.rs"));
    assert!(chunk.content.contains("old.rs"));
    assert!(chunk.content.contains("new.rs"));
}

#[test]
fn test_canonical_payload_is_deterministic() {
    let chunks = vec![
        Chunk::new(ChangeType::Modified, "a.rs", "+line"),
        Chunk::binary(ChangeType::Untracked, "b.bin"),
    ];
    assert_eq!(canonical_payload(&chunks), canonical_payload(&chunks.clone()));

    let other = vec![Chunk::new(ChangeType::Modified, "a.rs", "+other")];
    assert_ne!(canonical_payload(&chunks), canonical_payload(&other));
}

#[test]
fn test_redaction_replaces_sensitive_lines() {
    let line = "+api_key = \"sk-test123\"";
    assert_eq!(redact_line(line), REDACTED_LINE);
    assert!(!redact_line(line).contains("sk-test123"));

    // Clean lines pass through untouched.
    assert_eq!(redact_line("+fn add(a: i32, b: i32)"), "+fn add(a: i32, b: i32)");
}

#[test]
fn test_redaction_is_case_insensitive() {
    assert_eq!(redact_line("PASSWORD=hunter2"), REDACTED_LINE);
    assert_eq!(redact_line("Bearer abc123"), REDACTED_LINE);
}

#[test]
fn test_redaction_covers_auth_and_client_terms() {
    assert_eq!(redact_line("auth = \"basic xyz\""), REDACTED_LINE);
    assert_eq!(redact_line("Authorization: Basic dXNlcjpwYXNz"), REDACTED_LINE);
    assert_eq!(redact_line("client_id = \"abc-123\""), REDACTED_LINE);
    assert_eq!(redact_line("+PRIVATE_SIGNING_CERT=..."), REDACTED_LINE);
}

#[test]
fn test_redact_content_preserves_clean_lines() {
    let body = "fn main() {}\nlet secret = \"x\";\nfn other() {}";
    let redacted = redact_content(body);
    let lines: Vec<&str> = redacted.lines().collect();
    assert_eq!(lines[0], "fn main() {}");
    assert_eq!(lines[1], REDACTED_LINE);
    assert_eq!(lines[2], "fn other() {}");
}

#[test]
fn test_fingerprint_deterministic_for_same_state() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();

    let changes = ChangeSet {
        modified: vec!["a.rs".to_string()],
        ..Default::default()
    };

    let fp1 = fingerprint_change_set(dir.path(), &changes);
    let fp2 = fingerprint_change_set(dir.path(), &changes);
    assert_eq!(fp1, fp2);
}

#[test]
fn test_fingerprint_changes_when_mtime_changes() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.rs");
    std::fs::write(&file, "fn a() {}").unwrap();

    let changes = ChangeSet {
        modified: vec!["a.rs".to_string()],
        ..Default::default()
    };

    let before = fingerprint_change_set(dir.path(), &changes);

    // Rewrite identical content: size is unchanged but mtime moves.
    std::thread::sleep(Duration::from_millis(50));
    std::fs::write(&file, "fn a() {}").unwrap();

    let after = fingerprint_change_set(dir.path(), &changes);
    assert_ne!(before, after);
}

#[test]
fn test_fingerprint_changes_with_different_paths() {
    let dir = TempDir::new().unwrap();
    let a = ChangeSet {
        deleted: vec!["a.rs".to_string()],
        ..Default::default()
    };
    let b = ChangeSet {
        deleted: vec!["b.rs".to_string()],
        ..Default::default()
    };
    assert_ne!(
        fingerprint_change_set(dir.path(), &a),
        fingerprint_change_set(dir.path(), &b)
    );
}

#[test]
fn test_cache_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_dir(dir.path(), Duration::from_secs(60), true);

    assert_eq!(cache.get("commit", "payload"), None);
    cache.set("commit", "payload", "feat: add thing");
    assert_eq!(cache.get("commit", "payload").as_deref(), Some("feat: add thing"));

    // Different namespace means a different key.
    assert_eq!(cache.get("review", "payload"), None);
}

#[test]
fn test_cache_ttl_expiry_removes_entry() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_dir(dir.path(), Duration::from_millis(100), true);

    cache.set("commit", "payload", "value");
    assert!(cache.get("commit", "payload").is_some());

    std::thread::sleep(Duration::from_millis(250));
    assert_eq!(cache.get("commit", "payload"), None);

    // Lazy eviction deleted the entry file.
    let remaining = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
        .count();
    assert_eq!(remaining, 0);
}

#[test]
fn test_cache_disabled_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_dir(dir.path(), Duration::from_secs(60), false);

    cache.set("commit", "payload", "value");
    assert_eq!(cache.get("commit", "payload"), None);
}

#[test]
fn test_cache_clear() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_dir(dir.path(), Duration::from_secs(60), true);

    cache.set("commit", "a", "1");
    cache.set("review", "b", "2");
    let removed = cache.clear().unwrap();
    assert_eq!(removed, 2);
    assert_eq!(cache.get("commit", "a"), None);
}
