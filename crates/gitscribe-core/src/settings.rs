//! Immutable runtime settings
//!
//! All knobs are assembled once at startup from environment variables
//! (optionally seeded from a `.env` file) and passed by reference into each
//! component. Components never read the environment themselves, so tests can
//! construct arbitrary configurations without cross-talk.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Path fragments; any path containing one of these is skipped.
    pub ignore_patterns: Vec<String>,
    /// Files larger than this are dropped from the change set entirely.
    pub max_file_size_mb: f64,
    /// Hard upper bound on chunk content length, in bytes.
    pub max_chunk_size: usize,
    /// Upper bound on assembled prompt length, in bytes.
    pub max_context_length: usize,
    /// Quiet period after the last filesystem event before analysis runs.
    pub debounce_delay: Duration,
    /// Hard per-call timeout for the generation backend.
    pub generation_timeout: Duration,
    /// Retry cap for transient backend failures.
    pub max_retries: u32,
    /// Base delay between retries; grows linearly with the attempt number.
    pub retry_delay: Duration,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub cache_dir: PathBuf,
    /// Language for generated commit messages and reviews.
    pub message_language: String,
    /// Run a code review automatically after each watch-loop analysis.
    pub auto_review: bool,
    pub default_provider: String,
    pub default_model: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            max_file_size_mb: 5.0,
            max_chunk_size: 2000,
            max_context_length: 4000,
            debounce_delay: Duration::from_secs_f64(3.0),
            generation_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs_f64(1.0),
            cache_enabled: true,
            cache_ttl: Duration::from_secs(300),
            cache_dir: PathBuf::from(".gitscribe_cache"),
            message_language: "english".to_string(),
            auto_review: false,
            default_provider: "ollama".to_string(),
            default_model: None,
        }
    }
}

impl Settings {
    /// Build settings from the process environment, loading `.env` first if
    /// one is present. Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            ignore_patterns: std::env::var("IGNORE_PATTERNS")
                .map(|v| {
                    v.split(',')
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.ignore_patterns),
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            max_chunk_size: env_or("MAX_CHUNK_SIZE", defaults.max_chunk_size),
            max_context_length: env_or("MAX_CONTEXT_LENGTH", defaults.max_context_length),
            debounce_delay: Duration::from_secs_f64(env_or("DEBOUNCE_DELAY", 3.0)),
            generation_timeout: Duration::from_secs(env_or("GENERATION_TIMEOUT_SECONDS", 30)),
            max_retries: env_or("MAX_RETRIES", defaults.max_retries),
            retry_delay: Duration::from_secs_f64(env_or("RETRY_DELAY", 1.0)),
            cache_enabled: env_or("ENABLE_CACHE", true),
            cache_ttl: Duration::from_secs(env_or("CACHE_TTL_SECONDS", 300)),
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            message_language: std::env::var("MESSAGE_LANGUAGE")
                .unwrap_or(defaults.message_language),
            auto_review: env_or("AUTO_CODE_REVIEW", false),
            default_provider: std::env::var("DEFAULT_PROVIDER")
                .unwrap_or(defaults.default_provider),
            default_model: std::env::var("DEFAULT_MODEL").ok(),
        }
    }

    /// Size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb * 1024.0 * 1024.0) as u64
    }
}

fn default_ignore_patterns() -> Vec<String> {
    [
        ".git/",
        "target/",
        "node_modules/",
        "__pycache__/",
        ".pyc",
        ".DS_Store",
        "venv/",
        ".env",
        ".gitscribe_cache",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring unparseable value for {}: {:?}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
