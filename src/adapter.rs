//! Bridges an uploaded image to the vision model.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ImageEncoding;
use crate::encoding::{EncodedImage, ImagePayload};
use crate::error::{AppError, EncodeError};
use crate::model::VisionModel;
use crate::prompt::ANALYSIS_PROMPT;
use crate::staging::{ImageStage, StagedImage};

/// Returned in place of an empty completion.
pub const EMPTY_COMPLETION: &str = "No analysis text returned.";

#[derive(Clone)]
pub struct Adapter {
    model: Arc<dyn VisionModel>,
    encoding: ImageEncoding,
    stage: ImageStage,
    public_url: Option<String>,
}

impl Adapter {
    pub fn new(
        model: Arc<dyn VisionModel>,
        encoding: ImageEncoding,
        stage: ImageStage,
        public_url: Option<String>,
    ) -> Self {
        Self {
            model,
            encoding,
            stage,
            public_url,
        }
    }

    pub fn stage(&self) -> &ImageStage {
        &self.stage
    }

    /// Sends one image with the fixed prompt and returns the raw answer.
    pub async fn analyze(&self, image: ImagePayload) -> Result<String, AppError> {
        let start = Instant::now();
        let size = image.len();
        let media_type = image.media_type.clone();

        // Held until the model has answered so the staged URL stays reachable.
        let (encoded, _staged) = self.encode(image)?;

        let text = self.model.describe(ANALYSIS_PROMPT, &encoded).await?;

        tracing::info!(
            model = self.model.name(),
            encoding = %self.encoding,
            %media_type,
            size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );

        if text.trim().is_empty() {
            return Ok(EMPTY_COMPLETION.to_string());
        }
        Ok(text)
    }

    fn encode(&self, image: ImagePayload) -> Result<(EncodedImage, Option<StagedImage>), EncodeError> {
        match self.encoding {
            ImageEncoding::DataUri => Ok((EncodedImage::data_uri(&image), None)),
            ImageEncoding::Inline => Ok((EncodedImage::inline(&image), None)),
            ImageEncoding::RemoteUrl => {
                let public_url = self.public_url.as_deref().ok_or(EncodeError::MissingPublicUrl)?;
                let media_type = image.media_type.clone();
                let staged = self.stage.stage(image);
                let encoded = EncodedImage::Url {
                    url: staged.url(public_url),
                    media_type,
                };
                Ok((encoded, Some(staged)))
            }
        }
    }
}
