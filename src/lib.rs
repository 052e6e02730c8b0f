//! MicroVision AI: microscopy image analysis backed by a hosted vision model.
//!
//! The server half ([`adapter`], [`handlers`]) forwards an uploaded image with
//! a fixed prompt and returns the model's raw text. The [`interpret`] module
//! turns that text into four display sections and is shared by the web page
//! (through `POST /api/interpret`) and the command-line [`client`].

pub mod adapter;
pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod handlers;
pub mod interpret;
pub mod model;
pub mod prompt;
pub mod staging;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::adapter::Adapter;
use crate::config::Config;
use crate::staging::ImageStage;

pub struct AppState {
    pub adapter: Adapter,
}

impl AppState {
    pub fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    pub fn from_config(config: &Config) -> Self {
        let adapter = Adapter::new(
            model::from_config(config),
            config.encoding,
            ImageStage::new(),
            config.public_url.clone(),
        );
        Self::new(adapter)
    }
}

/// Builds the application router. `max_upload_bytes` of `None` leaves uploads
/// unbounded; size policy belongs to the deployment.
pub fn app(state: Arc<AppState>, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/interpret", post(handlers::interpret))
        .route("/api/images/:id", get(handlers::staged_image))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(body_limit),
        )
        .with_state(state)
}
