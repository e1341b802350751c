//! Gitscribe Core — change model, settings, fingerprinting, and result cache

pub mod cache;
pub mod change;
pub mod fingerprint;
pub mod redact;
pub mod settings;

#[cfg(test)]
pub mod tests;

pub use cache::{CacheError, ResultCache};
pub use change::{ChangeSet, ChangeType, Chunk, canonical_payload};
pub use fingerprint::{ChangeFingerprint, fingerprint_change_set};
pub use redact::{REDACTED_LINE, redact_content, redact_line};
pub use settings::Settings;
