use crate::config::Config;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DIAGNOSIS_PROMPT: &str = "Analyze this plant leaf image for diseases. Please provide a comprehensive analysis including:

1. **Disease Identification**: What disease(s) do you see, if any?
2. **Confidence Level**: How confident are you in this diagnosis?
3. **Severity Assessment**: How severe is the condition?
4. **Symptoms Description**: What specific symptoms are visible?
5. **Treatment Recommendations**: What should be done to treat this condition?
6. **Prevention Tips**: How to prevent this disease in the future?

If the plant appears healthy, please indicate that and provide general care tips. Format your response in a clear, readable manner with proper headings and bullet points where appropriate.";

pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Inference provider is not configured")]
    NotConfigured,
    #[error("Inference request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Inference provider responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Inference provider returned no text")]
    EmptyResponse,
}

/// A hosted multimodal model that turns a leaf photo into a diagnosis.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn analyze(&self, bytes: &[u8], mime_type: &str) -> Result<String, InferenceError>;
}

/// Calls an OpenAI-compatible chat completions endpoint.
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    async fn analyze(&self, bytes: &[u8], mime_type: &str) -> Result<String, InferenceError> {
        if self.api_key.is_empty() {
            return Err(InferenceError::NotConfigured);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: DIAGNOSIS_PROMPT,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_uri(mime_type, bytes),
                        },
                    },
                ],
            }],
        };

        debug!(model = %self.model, "Requesting analysis of {} bytes", bytes.len());

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(InferenceError::EmptyResponse)
    }
}
