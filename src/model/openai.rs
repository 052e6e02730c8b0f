use async_trait::async_trait;
use serde_json::{json, Value};

use super::{read_success, VisionModel};
use crate::encoding::EncodedImage;
use crate::error::UpstreamError;

/// OpenAI Responses API client.
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, api_base: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/responses", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn payload(&self, prompt: &str, image: &EncodedImage) -> Value {
        json!({
            "model": self.model,
            "input": [{
                "role": "user",
                "content": [
                    { "type": "input_text", "text": prompt },
                    { "type": "input_image", "image_url": image.as_image_url() }
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionModel for OpenAiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn describe(&self, prompt: &str, image: &EncodedImage) -> Result<String, UpstreamError> {
        tracing::info!(model = %self.model, "sending request to OpenAI");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(prompt, image))
            .send()
            .await?;

        let body = read_success(response).await?;
        output_text(&body)
    }
}

/// Concatenates every `output_text` part of every message in the response.
fn output_text(body: &Value) -> Result<String, UpstreamError> {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }

    let output = body
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| UpstreamError::Malformed("missing `output` array".into()))?;

    let text = output
        .iter()
        .filter(|item| item["type"] == "message")
        .filter_map(|item| item["content"].as_array())
        .flatten()
        .filter(|part| part["type"] == "output_text")
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    Ok(text)
}
