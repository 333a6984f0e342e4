//! Groq Chat Completions API provider (OpenAI-compatible wire format).
//!
//! Non-streaming: the pipeline returns one complete advisory per request,
//! so the first choice's message content is taken verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use medivoice_core::config::VisionConfig;
use medivoice_core::error::{MediVoiceError, Result};
use medivoice_core::types::NormalizedImage;

use crate::ChatProvider;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

pub struct GroqProvider {
    pub base_url: String,
    vision_model: String,
    text_model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(GROQ_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            vision_model: config.vision_model().to_string(),
            text_model: config.text_model().to_string(),
            api_key: config.resolve_api_key(),
            client: reqwest::Client::new(),
        }
    }

    async fn complete(&self, model: &str, messages: Vec<serde_json::Value>) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(MediVoiceError::MissingCredential("GROQ_API_KEY"))?;

        let body = ChatRequest {
            model: model.to_string(),
            messages,
        };

        debug!(model, base_url = %self.base_url, "Requesting chat completion");

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| MediVoiceError::RemoteService {
                service: "groq",
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediVoiceError::RemoteService {
                service: "groq",
                detail: format!("{status}: {body}"),
            });
        }

        let completion: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| MediVoiceError::RemoteService {
                    service: "groq",
                    detail: e.to_string(),
                })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MediVoiceError::RemoteService {
                service: "groq",
                detail: "completion contained no choices".into(),
            })
    }
}

/// Build the single two-part user message: instruction text plus the image
/// as an embedded base64 data URL.
pub fn build_vision_message(query: &str, image: &NormalizedImage) -> serde_json::Value {
    json!({
        "role": "user",
        "content": [
            { "type": "text", "text": query },
            { "type": "image_url", "image_url": { "url": image.to_data_url() } },
        ],
    })
}

#[async_trait]
impl ChatProvider for GroqProvider {
    fn id(&self) -> &str {
        "groq"
    }

    async fn complete_with_image(&self, query: &str, image: &NormalizedImage) -> Result<String> {
        let messages = vec![build_vision_message(query, image)];
        self.complete(&self.vision_model, messages).await
    }

    async fn complete_text(&self, query: &str) -> Result<String> {
        let messages = vec![json!({ "role": "user", "content": query })];
        self.complete(&self.text_model, messages).await
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
