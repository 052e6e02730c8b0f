//! Short-lived image hosting for the `remote-url` encoding.
//!
//! An upload is staged for exactly as long as its upstream call runs; the
//! returned [`StagedImage`] guard removes it on drop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use uuid::Uuid;

use crate::encoding::ImagePayload;

#[derive(Clone, Default)]
pub struct ImageStage {
    images: Arc<Mutex<HashMap<Uuid, ImagePayload>>>,
}

impl ImageStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, payload: ImagePayload) -> StagedImage {
        let id = Uuid::new_v4();
        self.lock().insert(id, payload);
        tracing::debug!(%id, "staged image");
        StagedImage {
            id,
            stage: self.clone(),
        }
    }

    /// Media type and bytes of a staged image.
    pub fn get(&self, id: &Uuid) -> Option<(String, Bytes)> {
        self.lock()
            .get(id)
            .map(|p| (p.media_type.clone(), p.bytes.clone()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ImagePayload>> {
        // A poisoned map still holds valid entries.
        self.images.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Keeps an image staged until dropped.
pub struct StagedImage {
    id: Uuid,
    stage: ImageStage,
}

impl StagedImage {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self, public_url: &str) -> String {
        format!("{public_url}/api/images/{}", self.id)
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        self.stage.lock().remove(&self.id);
        tracing::debug!(id = %self.id, "released staged image");
    }
}
