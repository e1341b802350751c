//! Secret redaction for diff and file content
//!
//! Any line matching one of the sensitive terms is replaced wholesale before
//! it reaches a chunk, so neither chunk content nor cache keys ever derive
//! from raw secret-looking text. This is a substring heuristic: a term
//! appearing inside an unrelated identifier (e.g. "tokenizer") still trips
//! it, which we accept as the safe direction to fail in.

use std::borrow::Cow;

/// Case-insensitive substrings that mark a line as sensitive.
const SENSITIVE_TERMS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "api_key",
    "apikey",
    "access_token",
    "refresh_token",
    "client_secret",
    "client_id",
    "private_key",
    "private",
    "secret",
    "token",
    "credential",
    "session",
    "auth",
    "jwt",
    "bearer",
];

/// Placeholder substituted for a sensitive line.
pub const REDACTED_LINE: &str = "... (line redacted: contains sensitive data)";

/// Whether a line contains any sensitive term.
pub fn is_sensitive(line: &str) -> bool {
    let lower = line.to_lowercase();
    SENSITIVE_TERMS.iter().any(|term| lower.contains(term))
}

/// Replace a sensitive line with the placeholder; pass clean lines through.
pub fn redact_line(line: &str) -> Cow<'_, str> {
    if is_sensitive(line) {
        Cow::Borrowed(REDACTED_LINE)
    } else {
        Cow::Borrowed(line)
    }
}

/// Redact a multi-line body line by line, preserving line structure.
pub fn redact_content(text: &str) -> String {
    if !is_sensitive(text) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut first = true;
    for line in text.lines() {
        if !first {
            out.push('\n');
        }
        out.push_str(&redact_line(line));
        first = false;
    }
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}
