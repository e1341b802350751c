//! Gitscribe AI — text-generation backends and commit analysis
//!
//! This crate turns chunked code changes into commit messages and code
//! reviews. A [`GenerationBackend`] abstracts the model behind a single
//! prompt-in/text-out call; [`CommitAnalyzer`] orchestrates prompts,
//! caching, and output cleanup on top of it.

pub mod analyzer;
pub mod backend;
pub mod prompt;
pub mod providers;


pub use analyzer::{CommitAnalyzer, Review};
pub use backend::{BackendError, GenerationBackend, generate_with_retry};
pub use prompt::PromptSet;
pub use providers::create_backend;
