//! Gitscribe Git — working-tree scanning and diff chunking
//!
//! This crate turns a raw git working tree into the bounded, redacted units
//! of work the generation pipeline consumes: `ChangeScanner` classifies every
//! changed path into a [`gitscribe_core::ChangeSet`], and `DiffChunker`
//! expands that set into size-bounded [`gitscribe_core::Chunk`]s.

pub mod chunker;
pub mod error;
pub mod repo;
pub mod scanner;


#[cfg(test)]
pub mod test_utils;

pub use chunker::DiffChunker;
pub use error::{GitError, Result};
pub use repo::GitRepo;
pub use scanner::ChangeScanner;
