//! OpenRouter hosted API backend (OpenAI-compatible chat format)

use crate::backend::{BackendError, GenerationBackend};
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenRouterBackend {
    pub fn new(model: Option<String>) -> Result<Self, BackendError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BackendError::Auth("OPENROUTER_API_KEY"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl GenerationBackend for OpenRouterBackend {
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
            max_tokens: 500,
            temperature: 0.7,
        };

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("User-Agent", "gitscribe/0.1")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => BackendError::RateLimited(body),
                401 | 403 => BackendError::Auth("OPENROUTER_API_KEY"),
                s if s >= 500 => {
                    BackendError::Unavailable(format!("OpenRouter returned {}: {}", status, body))
                }
                _ => BackendError::InvalidResponse(format!(
                    "OpenRouter returned {}: {}",
                    status, body
                )),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                BackendError::InvalidResponse("no completion in OpenRouter response".to_string())
            })
    }

    fn name(&self) -> &str {
        "OpenRouter"
    }
}
