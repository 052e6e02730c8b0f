//! HTTP handlers.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::encoding::ImagePayload;
use crate::error::{AppError, NO_IMAGE_PROVIDED};
use crate::interpret::Interpretation;
use crate::AppState;

/// Multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

#[derive(Serialize, Deserialize, Debug)]
pub struct AnalyzeResponse {
    pub result: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InterpretRequest {
    pub text: String,
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("page.html"))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    tracing::info!("analysis requested");

    let multipart = multipart.map_err(|e| {
        tracing::warn!("rejected non-multipart upload: {e}");
        AppError::InvalidRequest("Invalid upload".into())
    })?;
    let image = read_image(multipart).await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        tracing::warn!("unreadable multipart body: {e}");
        AppError::InvalidRequest("Invalid upload".into())
    })?;
    let image = image
        .filter(|image| !image.is_empty())
        .ok_or_else(|| AppError::InvalidRequest(NO_IMAGE_PROVIDED.into()))?;

    let result = state.adapter.analyze(image).await?;
    Ok(Json(AnalyzeResponse { result }))
}

/// Finds the `image` field, skipping anything else in the form.
async fn read_image(mut multipart: Multipart) -> Result<Option<ImagePayload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let declared = field.content_type().map(str::to_owned);
        let data = field.bytes().await?;
        return Ok(Some(ImagePayload::new(data, declared.as_deref())));
    }
    Ok(None)
}

pub async fn interpret(Json(request): Json<InterpretRequest>) -> Json<Interpretation> {
    Json(Interpretation::from_text(&request.text))
}

/// Serves an image staged for a `remote-url` upstream call.
pub async fn staged_image(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    match state.adapter.stage().get(&id) {
        Some((media_type, bytes)) => ([(header::CONTENT_TYPE, media_type)], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
