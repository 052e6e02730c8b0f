//! Clients for the hosted multimodal models.
//!
//! Both providers answer the same question: given a prompt and one image,
//! return a single text completion.

mod gemini;
mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, Provider};
use crate::encoding::EncodedImage;
use crate::error::UpstreamError;

/// Longest slice of an upstream error body kept for the logs.
const ERROR_BODY_LIMIT: usize = 500;

#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Human-readable model identifier, for logs.
    fn name(&self) -> &str;

    async fn describe(&self, prompt: &str, image: &EncodedImage) -> Result<String, UpstreamError>;
}

pub fn from_config(config: &Config) -> Arc<dyn VisionModel> {
    let client = reqwest::Client::new();
    match config.provider {
        Provider::OpenAi => Arc::new(OpenAiClient::new(
            client,
            &config.api_base,
            &config.api_key,
            &config.model,
        )),
        Provider::Gemini => Arc::new(GeminiClient::new(
            client,
            &config.api_base,
            &config.api_key,
            &config.model,
        )),
    }
}

/// Reads the body of a response, turning non-2xx statuses into errors.
async fn read_success(response: reqwest::Response) -> Result<serde_json::Value, UpstreamError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
}
