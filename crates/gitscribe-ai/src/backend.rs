//! Generation backend abstraction and retry policy

use async_trait::async_trait;
use gitscribe_core::Settings;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The model endpoint cannot be reached or is down. Transient.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The API rejected the call for quota reasons. Transient.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The hard per-call deadline elapsed. Transient.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered but the body was not usable.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Missing or rejected credentials. Never retried.
    #[error("missing or invalid API key: set {0} in the environment or .env")]
    Auth(&'static str),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl BackendError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Unavailable(_)
            | BackendError::RateLimited(_)
            | BackendError::Timeout(_) => true,
            BackendError::Request(e) => e.is_timeout() || e.is_connect(),
            BackendError::InvalidResponse(_) | BackendError::Auth(_) => false,
        }
    }
}

/// A prompt-in, text-out model endpoint.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError>;

    /// Human-readable backend name for logs and the CLI banner.
    fn name(&self) -> &str;
}

/// Drive one generation call under the configured deadline, retrying
/// transient failures with a linearly growing delay. Permanent failures
/// surface immediately; the deadline itself is never retried.
pub async fn generate_with_retry(
    backend: &dyn GenerationBackend,
    prompt: &str,
    system_prompt: Option<&str>,
    settings: &Settings,
) -> Result<String, BackendError> {
    let mut last_error = None;

    for attempt in 0..settings.max_retries {
        let call = backend.generate(prompt, system_prompt);
        match tokio::time::timeout(settings.generation_timeout, call).await {
            Ok(Ok(text)) => return Ok(text),
            Ok(Err(e)) if e.is_transient() => {
                tracing::warn!(
                    "{} attempt {}/{} failed: {}",
                    backend.name(),
                    attempt + 1,
                    settings.max_retries,
                    e
                );
                last_error = Some(e);
                if attempt + 1 < settings.max_retries {
                    tokio::time::sleep(settings.retry_delay * (attempt + 1)).await;
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(BackendError::Timeout(settings.generation_timeout)),
        }
    }

    Err(last_error
        .unwrap_or_else(|| BackendError::Unavailable("retry budget exhausted".to_string())))
}
