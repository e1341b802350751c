//! Commit-message and review orchestration
//!
//! `CommitAnalyzer` sits between the chunked change set and the generation
//! backend: it assembles prompts, consults the result cache so an unchanged
//! tree never costs a second model call, and cleans the raw model output.

use crate::backend::{GenerationBackend, generate_with_retry};
use crate::prompt::PromptSet;
use anyhow::Result;
use gitscribe_core::{ChangeType, Chunk, ResultCache, Settings, canonical_payload};
use regex::Regex;
use std::sync::LazyLock;

/// Preview budget when summarizing one file's diff for the commit prompt.
const MAX_DIFF_PREVIEW_LINES: usize = 15;
/// How many files the change summary names before eliding the rest.
const MAX_FILES_IN_SUMMARY: usize = 5;
/// Line cap when extracting the important part of an oversized review diff.
const MAX_IMPORTANT_LINES: usize = 100;

const REVIEWABLE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".java", ".cpp", ".c", ".go", ".rs", ".rb", ".php",
];

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is a valid regex"));

/// One per-file review result.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub file: String,
    pub change_type: ChangeType,
    pub review: String,
}

pub struct CommitAnalyzer {
    backend: Box<dyn GenerationBackend>,
    cache: ResultCache,
    prompts: PromptSet,
    settings: Settings,
}

impl CommitAnalyzer {
    pub fn new(backend: Box<dyn GenerationBackend>, settings: &Settings) -> Self {
        Self {
            backend,
            cache: ResultCache::new(settings),
            prompts: PromptSet::for_language(&settings.message_language),
            settings: settings.clone(),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate a commit message for the whole chunk set. Identical chunk
    /// sets hit the cache instead of the backend; an empty set returns an
    /// empty message without any backend call.
    pub async fn generate_commit_message(&self, chunks: &[Chunk]) -> Result<String> {
        if chunks.is_empty() {
            return Ok(String::new());
        }

        let payload = canonical_payload(chunks);
        if let Some(hit) = self.cache.get("commit", &payload) {
            tracing::debug!("Commit message served from cache");
            return Ok(hit);
        }

        let summary = summarize_changes(chunks);
        let mut user_prompt = self.prompts.commit_user(&summary);
        if user_prompt.len() > self.settings.max_context_length {
            user_prompt = truncate_prompt(&user_prompt, self.settings.max_context_length);
        }

        let raw = generate_with_retry(
            self.backend.as_ref(),
            &user_prompt,
            Some(self.prompts.commit_system()),
            &self.settings,
        )
        .await?;
        let message = clean_output(&raw);

        self.cache.set("commit", &payload, &message);
        Ok(message)
    }

    /// Review each reviewable chunk individually. Binary, flagged, and
    /// non-source chunks are skipped with a logged reason; previously
    /// reviewed chunks come from the cache.
    pub async fn review_changes(&self, chunks: &[Chunk]) -> Result<Vec<Review>> {
        if chunks.is_empty() {
            tracing::debug!("No chunks to review");
            return Ok(Vec::new());
        }

        let mut reviews = Vec::new();
        let mut skipped = 0usize;
        let mut cache_hits = 0usize;

        for (i, chunk) in chunks.iter().enumerate() {
            if !should_review(chunk) {
                skipped += 1;
                tracing::debug!(
                    "Chunk {}/{}: {} skipped ({})",
                    i + 1,
                    chunks.len(),
                    chunk.path,
                    skip_reason(chunk)
                );
                continue;
            }

            let payload = canonical_payload(std::slice::from_ref(chunk));
            if let Some(hit) = self.cache.get("review", &payload) {
                cache_hits += 1;
                reviews.push(Review {
                    file: chunk.path.clone(),
                    change_type: chunk.change_type,
                    review: hit,
                });
                continue;
            }

            let diff = if chunk.content.len() > self.settings.max_chunk_size {
                extract_important_diff(&chunk.content, self.settings.max_chunk_size)
            } else {
                chunk.content.clone()
            };
            let user_prompt =
                self.prompts
                    .review_user(&chunk.path, &chunk.change_type.to_string(), &diff);

            let raw = generate_with_retry(
                self.backend.as_ref(),
                &user_prompt,
                Some(self.prompts.review_system()),
                &self.settings,
            )
            .await?;
            let review = clean_output(&raw);

            self.cache.set("review", &payload, &review);
            reviews.push(Review {
                file: chunk.path.clone(),
                change_type: chunk.change_type,
                review,
            });
        }

        tracing::debug!(
            "Review pass done: {} chunks, {} reviewed, {} skipped, {} cache hits",
            chunks.len(),
            reviews.len(),
            skipped,
            cache_hits
        );
        Ok(reviews)
    }

    /// Drop every cached result. Returns the number of entries removed.
    pub fn clear_cache(&self) -> Result<usize> {
        Ok(self.cache.clear()?)
    }
}

/// Whether a chunk is worth sending for review: readable source code in a
/// change category that has content to discuss.
pub(crate) fn should_review(chunk: &Chunk) -> bool {
    if chunk.binary || chunk.security_blocked || chunk.size_exceeded {
        return false;
    }
    if !REVIEWABLE_EXTENSIONS
        .iter()
        .any(|ext| chunk.path.ends_with(ext))
    {
        return false;
    }
    matches!(
        chunk.change_type,
        ChangeType::Added | ChangeType::Modified | ChangeType::Untracked
    )
}

pub(crate) fn skip_reason(chunk: &Chunk) -> String {
    if chunk.binary {
        return "binary file".to_string();
    }
    if chunk.security_blocked {
        return "blocked for security".to_string();
    }
    if chunk.size_exceeded {
        return "file too large".to_string();
    }
    if !REVIEWABLE_EXTENSIONS
        .iter()
        .any(|ext| chunk.path.ends_with(ext))
    {
        let suffix = chunk
            .path
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_else(|| "no extension".to_string());
        return format!("unsupported file type ({suffix})");
    }
    format!("change type {} not reviewed", chunk.change_type)
}

/// Group chunks per file and render a compact summary with short diff
/// previews, capped at a handful of files.
pub(crate) fn summarize_changes(chunks: &[Chunk]) -> String {
    let mut files: Vec<(&str, Vec<&Chunk>)> = Vec::new();
    for chunk in chunks {
        let path = chunk.old_path.as_deref().unwrap_or(&chunk.path);
        match files.iter_mut().find(|(p, _)| *p == path) {
            Some((_, list)) => list.push(chunk),
            None => files.push((path, vec![chunk])),
        }
    }

    let mut parts = Vec::new();
    for (i, (path, changes)) in files.iter().enumerate() {
        if i >= MAX_FILES_IN_SUMMARY {
            parts.push(format!("\n... and {} more files", files.len() - i));
            break;
        }
        parts.push(format!("\nFile: {path}"));
        for chunk in changes {
            match (&chunk.old_path, &chunk.new_path) {
                (Some(old), Some(new)) => parts.push(format!("- Renamed: {old} -> {new}")),
                _ => {
                    parts.push(format!("- {}", chunk.change_type));
                    if !chunk.content.is_empty() {
                        parts.extend(format_diff_preview(&chunk.content));
                    }
                }
            }
        }
    }
    parts.join("\n")
}

fn format_diff_preview(diff: &str) -> Vec<String> {
    let head: Vec<&str> = diff.lines().take(MAX_DIFF_PREVIEW_LINES).collect();

    let mut important: Vec<&str> = head
        .iter()
        .copied()
        .filter(|l| {
            (l.starts_with('+') || l.starts_with('-'))
                && !l.starts_with("+++")
                && !l.starts_with("---")
        })
        .collect();
    if important.is_empty() {
        important = head.iter().copied().take(5).collect();
    }

    let mut preview = vec!["```diff".to_string()];
    preview.extend(important.iter().take(10).map(|l| l.to_string()));
    if diff.lines().count() > MAX_DIFF_PREVIEW_LINES {
        preview.push("...".to_string());
    }
    preview.push("```".to_string());
    preview
}

/// Keep the added and removed lines of an oversized diff, then pad with a
/// few context lines if budget remains.
pub(crate) fn extract_important_diff(diff: &str, max_size: usize) -> String {
    if diff.is_empty() || max_size == 0 {
        return String::new();
    }

    let mut kept = Vec::new();
    let mut size = 0usize;
    for line in diff.lines() {
        if (line.starts_with('+') || line.starts_with('-'))
            && !line.starts_with("+++")
            && !line.starts_with("---")
        {
            if size + line.len() > max_size {
                break;
            }
            kept.push(line);
            size += line.len() + 1;
            if kept.len() > MAX_IMPORTANT_LINES {
                kept.push("... (further changes elided)");
                break;
            }
        }
    }

    let remaining = max_size.saturating_sub(size);
    if remaining > 0 {
        let context = diff
            .lines()
            .filter(|l| !l.starts_with('+') && !l.starts_with('-'))
            .take((remaining / 50).min(10));
        kept.extend(context);
    }
    kept.join("\n")
}

/// Strip tag markup the model may wrap its answer in, then trim.
pub(crate) fn clean_output(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").trim().to_string()
}

/// Cut a prompt down to the context budget on a line boundary, marking the
/// elision.
pub(crate) fn truncate_prompt(prompt: &str, max_length: usize) -> String {
    let mut kept = Vec::new();
    let mut length = 0usize;
    for line in prompt.lines() {
        if length + line.len() > max_length {
            if !kept.is_empty() {
                kept.push("... (remaining changes omitted)");
            }
            break;
        }
        kept.push(line);
        length += line.len() + 1;
    }
    kept.join("\n")
}
