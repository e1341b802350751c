//! Generation backend implementations

pub mod gemini;
pub mod ollama;
pub mod openrouter;

use crate::backend::GenerationBackend;
use anyhow::Result;

/// Instantiate a backend by name, with an optional model override.
pub fn create_backend(provider: &str, model: Option<String>) -> Result<Box<dyn GenerationBackend>> {
    match provider {
        "ollama" => Ok(Box::new(ollama::OllamaBackend::new(model))),
        "openrouter" => Ok(Box::new(openrouter::OpenRouterBackend::new(model)?)),
        "gemini" => Ok(Box::new(gemini::GeminiBackend::new(model)?)),
        _ => anyhow::bail!("Unknown provider: {} (expected ollama, openrouter, or gemini)", provider),
    }
}
