use async_trait::async_trait;
use serde_json::{json, Value};

use super::{read_success, VisionModel};
use crate::encoding::EncodedImage;
use crate::error::UpstreamError;

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, api_base: &str, api_key: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                api_base.trim_end_matches('/'),
                model
            ),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn payload(prompt: &str, image: &EncodedImage) -> Value {
        let image_part = match image {
            EncodedImage::Url { url, media_type } => json!({
                "file_data": { "mime_type": media_type, "file_uri": url }
            }),
            EncodedImage::Inline { media_type, data } => json!({
                "inline_data": { "mime_type": media_type, "data": data }
            }),
            EncodedImage::DataUri(uri) => match image.inline_parts() {
                Some((mime_type, data)) => json!({
                    "inline_data": { "mime_type": mime_type, "data": data }
                }),
                // Not base64: let the API resolve it as a URI.
                None => json!({ "file_data": { "file_uri": uri } }),
            },
        };

        json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    image_part
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn describe(&self, prompt: &str, image: &EncodedImage) -> Result<String, UpstreamError> {
        tracing::info!(model = %self.model, "sending request to Google Gemini");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::payload(prompt, image))
            .send()
            .await?;

        let body = read_success(response).await?;
        candidate_text(&body)
    }
}

fn candidate_text(body: &Value) -> Result<String, UpstreamError> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| UpstreamError::Malformed("no candidate parts in response".into()))?;

    Ok(parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect::<Vec<_>>()
        .join(""))
}
