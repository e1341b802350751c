//! Google Gemini REST backend

use crate::backend::{BackendError, GenerationBackend};
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "gemini-pro";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini rejects very long inputs outright; cap before sending.
const MAX_PROMPT_LENGTH: usize = 30_000;

pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiBackend {
    pub fn new(model: Option<String>) -> Result<Self, BackendError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(BackendError::Auth("GEMINI_API_KEY"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        if prompt.len() > MAX_PROMPT_LENGTH {
            return Err(BackendError::InvalidResponse(format!(
                "prompt too long for Gemini ({} > {} bytes)",
                prompt.len(),
                MAX_PROMPT_LENGTH
            )));
        }

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 500,
            },
            system_instruction: system_prompt.map(|s| Content {
                parts: vec![Part {
                    text: s.to_string(),
                }],
            }),
        };

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => BackendError::RateLimited(body),
                401 | 403 => BackendError::Auth("GEMINI_API_KEY"),
                s if s >= 500 => {
                    BackendError::Unavailable(format!("Gemini returned {}: {}", status, body))
                }
                _ => BackendError::InvalidResponse(format!("Gemini returned {}: {}", status, body)),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BackendError::InvalidResponse("no candidate text in Gemini response".to_string())
            })
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}
