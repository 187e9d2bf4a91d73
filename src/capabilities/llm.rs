//! Text generation backends for the `generate_text` tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";
pub const DEFAULT_MODEL: &str = "qwen-max";
const GENERATION_PATH: &str = "/services/aigc/text-generation/generation";
const DEFAULT_MAX_TOKENS: u32 = 1_000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to text generation API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text generation API returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("unexpected text generation response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<String, GenerationError>;
}

/// Offline generator used when no API key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderGenerator;

#[async_trait]
impl TextGenerator for PlaceholderGenerator {
    async fn generate(&self, prompt: &str, _model: Option<&str>) -> Result<String, GenerationError> {
        Ok(format!("Generated text for prompt: {prompt}"))
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    input: GenerationInput<'a>,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    output: GenerationOutput,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    text: Option<String>,
}

/// Client for the DashScope (Qwen) text-generation endpoint.
pub struct DashScopeGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl DashScopeGenerator {
    pub fn with_config(
        api_key: String,
        base_url: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_DASHSCOPE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for DashScopeGenerator {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<String, GenerationError> {
        let model = model.unwrap_or(&self.default_model);
        let url = format!("{}{GENERATION_PATH}", self.base_url);
        debug!(model = %model, prompt_len = prompt.len(), "requesting text generation");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-DashScope-SSE", "disable")
            .json(&GenerationRequest {
                model,
                input: GenerationInput { prompt },
                parameters: GenerationParameters {
                    max_tokens: DEFAULT_MAX_TOKENS,
                    temperature: DEFAULT_TEMPERATURE,
                },
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), model = %model, "text generation API rejected request");
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerationResponse = serde_json::from_str(&body)
            .map_err(|err| GenerationError::InvalidResponse(err.to_string()))?;

        parsed
            .output
            .text
            .ok_or_else(|| GenerationError::InvalidResponse("missing output.text".to_string()))
    }
}
