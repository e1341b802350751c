//! Gitscribe Watcher — debounced change monitoring
//!
//! Watches a working tree for filesystem events and drives one analysis
//! pass per burst of changes: events restart a debounce window, the window
//! closing triggers the pipeline, and a fingerprint of the change set
//! suppresses passes over trees that have not actually changed.

pub mod pipeline;
pub mod watch;

#[cfg(test)]
pub mod tests;

pub use pipeline::{ChangePipeline, GitPipeline};
pub use watch::{SessionStats, WatchHandle, WatchLoop};
