//! Ollama local model daemon backend

use crate::backend::{BackendError, GenerationBackend};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gemma3:1b";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Models worth suggesting for code analysis, in preference order.
const PREFERRED_MODELS: &[&str] = &[
    "gemma3:1b",
    "qwen2.5-coder:1.5b",
    "qwen2.5-coder:3b",
    "llama3.2:1b",
    "llama3.2:3b",
    "codellama:7b",
    "codellama",
    "llama3.1:8b",
    "mistral",
    "phi3",
    "qwen2.5-coder:7b",
];

pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaBackend {
    pub fn new(model: Option<String>) -> Self {
        Self::with_base_url(model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(model: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Quick probe of the daemon; used at startup to warn early when it is
    /// unreachable instead of on the first generation call.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Names of the models installed in the daemon; empty when unreachable.
    pub async fn available_models(&self) -> Vec<String> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        match response {
            Ok(r) if r.status().is_success() => r
                .json::<TagsResponse>()
                .await
                .map(|t| t.models.into_iter().map(|m| m.name).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// First installed model from the preference list, falling back to
    /// whatever is installed first.
    pub async fn suggest_model(&self) -> Option<String> {
        let installed = self.available_models().await;
        for preferred in PREFERRED_MODELS {
            if let Some(name) = installed
                .iter()
                .find(|n| n.contains(preferred) || n.starts_with(preferred))
            {
                return Some(name.clone());
            }
        }
        installed.into_iter().next()
    }
}

#[async_trait::async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: ChatOptions {
                temperature: 0.7,
                num_predict: 500,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.as_u16() == 429 {
                BackendError::RateLimited(body)
            } else if status.is_server_error() {
                BackendError::Unavailable(format!("Ollama returned {}: {}", status, body))
            } else {
                BackendError::InvalidResponse(format!("Ollama returned {}: {}", status, body))
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        if chat.message.content.is_empty() {
            return Err(BackendError::InvalidResponse(
                "empty completion from Ollama".to_string(),
            ));
        }
        Ok(chat.message.content)
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
