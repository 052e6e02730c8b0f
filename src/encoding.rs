//! Image payloads and their wire representations.
//!
//! Bytes are only ever base64-wrapped, never decoded or recompressed, so the
//! model sees exactly what the user uploaded.

use axum::body::Bytes;
use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// An uploaded image: raw bytes plus the media type we will declare upstream.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub media_type: String,
}

impl ImagePayload {
    /// Uses the declared content type when it names an image, otherwise sniffs
    /// the magic bytes.
    pub fn new(bytes: impl Into<Bytes>, declared: Option<&str>) -> Self {
        let bytes = bytes.into();
        let media_type = resolve_media_type(&bytes, declared);
        Self { bytes, media_type }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

fn resolve_media_type(bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|d| d.starts_with("image/")) {
        return declared.to_string();
    }
    image::guess_format(bytes)
        .ok()
        .and_then(mime_for_format)
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

fn mime_for_format(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Tiff => Some("image/tiff"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// The image as it travels inside a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedImage {
    DataUri(String),
    Inline { media_type: String, data: String },
    Url { url: String, media_type: String },
}

impl EncodedImage {
    pub fn data_uri(payload: &ImagePayload) -> Self {
        EncodedImage::DataUri(payload.to_data_uri())
    }

    pub fn inline(payload: &ImagePayload) -> Self {
        EncodedImage::Inline {
            media_type: payload.media_type.clone(),
            data: payload.to_base64(),
        }
    }

    /// A value usable wherever an API takes an `image_url`.
    pub fn as_image_url(&self) -> String {
        match self {
            EncodedImage::DataUri(uri) => uri.clone(),
            EncodedImage::Inline { media_type, data } => format!("data:{media_type};base64,{data}"),
            EncodedImage::Url { url, .. } => url.clone(),
        }
    }

    /// Media type and base64 payload, for APIs that want them separately.
    /// `None` for URL references.
    pub fn inline_parts(&self) -> Option<(&str, &str)> {
        match self {
            EncodedImage::DataUri(uri) => {
                let rest = uri.strip_prefix("data:")?;
                let (media_type, data) = rest.split_once(";base64,")?;
                Some((media_type, data))
            }
            EncodedImage::Inline { media_type, data } => Some((media_type, data)),
            EncodedImage::Url { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 13];

    #[test]
    fn test_declared_image_type_wins() {
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), Some("image/tiff"));
        assert_eq!(payload.media_type, "image/tiff");
    }

    #[test]
    fn test_sniffs_when_declared_type_is_generic() {
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), Some("application/octet-stream"));
        assert_eq!(payload.media_type, "image/png");

        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), None);
        assert_eq!(payload.media_type, "image/png");
    }

    #[test]
    fn test_unknown_bytes_fall_back_to_octet_stream() {
        let payload = ImagePayload::new(b"not an image".to_vec(), None);
        assert_eq!(payload.media_type, OCTET_STREAM);
    }

    #[test]
    fn test_data_uri_is_lossless() {
        let raw: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let payload = ImagePayload::new(raw.clone(), Some("image/png"));
        let encoded = EncodedImage::data_uri(&payload);

        let (media_type, data) = encoded.inline_parts().unwrap();
        assert_eq!(media_type, "image/png");
        assert_eq!(general_purpose::STANDARD.decode(data).unwrap(), raw);
    }

    #[test]
    fn test_inline_and_data_uri_agree_on_image_url() {
        let payload = ImagePayload::new(PNG_MAGIC.to_vec(), None);
        assert_eq!(
            EncodedImage::inline(&payload).as_image_url(),
            EncodedImage::data_uri(&payload).as_image_url()
        );
    }

    #[test]
    fn test_url_has_no_inline_parts() {
        let encoded = EncodedImage::Url {
            url: "https://scope.example.org/api/images/abc".into(),
            media_type: "image/png".into(),
        };
        assert_eq!(encoded.inline_parts(), None);
        assert_eq!(encoded.as_image_url(), "https://scope.example.org/api/images/abc");
    }
}
