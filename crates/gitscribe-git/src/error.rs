use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitError>;

#[derive(Debug, Error)]
pub enum GitError {
    /// The target path is not a valid git working tree. Fatal to the current
    /// invocation; never retried.
    #[error("not a git repository: {0}")]
    Repository(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// Per-path I/O failure. Callers isolate this to the affected path.
    #[error("cannot read {path}: {source}")]
    FileAccess {
        path: String,
        source: std::io::Error,
    },
}
