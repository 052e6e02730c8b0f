//! Error types for the analysis service.
//!
//! Every handler failure funnels into [`AppError`], which decides the HTTP
//! status and the message the caller is allowed to see.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Message returned for every failure after the upload was accepted.
pub const ANALYSIS_FAILED: &str = "Analysis failed";

/// Message returned when the `image` field is absent.
pub const NO_IMAGE_PROVIDED: &str = "No image provided";

/// Message returned when the upload exceeds the configured body limit.
pub const IMAGE_TOO_LARGE: &str = "Image too large";

/// Failures talking to the hosted vision model.
#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("request to vision model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vision model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape from vision model: {0}")]
    Malformed(String),
}

/// Failures preparing the image for the upstream request.
#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("remote-url encoding requires MICROVISION_PUBLIC_URL")]
    MissingPublicUrl,
}

/// Errors surfaced at the request boundary.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// User-correctable problem with the upload.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upstream(_) | AppError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text the client sees. Internal detail stays in the logs.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::InvalidRequest(msg) => msg,
            AppError::PayloadTooLarge => IMAGE_TOO_LARGE,
            AppError::Upstream(_) | AppError::Encode(_) => ANALYSIS_FAILED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::InvalidRequest(msg) => tracing::warn!("rejected upload: {msg}"),
            AppError::PayloadTooLarge => tracing::warn!("rejected upload: {self}"),
            other => tracing::error!(error = ?other, "analysis error: {other}"),
        }
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
