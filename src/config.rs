//! Runtime configuration read from the process environment.
//!
//! `.env` files are honoured through `dotenvy` in `main`; everything here works
//! on a plain key lookup so tests can feed values without touching the real
//! environment.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in the environment or a .env file")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: expected one of {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Which hosted model family answers the analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
}

impl Provider {
    pub fn key_var(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4.1-mini",
            Provider::Gemini => "gemini-2.5-flash",
        }
    }

    pub fn default_api_base(self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_API_BASE,
            Provider::Gemini => GEMINI_API_BASE,
        }
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" | "google" => Ok(Provider::Gemini),
            _ => Err(()),
        }
    }
}

/// How the uploaded bytes are attached to the model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageEncoding {
    /// `data:<media>;base64,<payload>`
    #[default]
    DataUri,
    /// Bare base64 with the media type sent alongside.
    Inline,
    /// Staged on this server and referenced by URL.
    RemoteUrl,
}

impl FromStr for ImageEncoding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "data-uri" | "datauri" => Ok(ImageEncoding::DataUri),
            "inline" | "blob" => Ok(ImageEncoding::Inline),
            "remote-url" | "url" => Ok(ImageEncoding::RemoteUrl),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageEncoding::DataUri => "data-uri",
            ImageEncoding::Inline => "inline",
            ImageEncoding::RemoteUrl => "remote-url",
        })
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: String,
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub encoding: ImageEncoding,
    pub public_url: Option<String>,
    pub max_upload_bytes: Option<usize>,
}

// The API key never reaches the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("encoding", &self.encoding)
            .field("public_url", &self.public_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("MICROVISION_PROVIDER") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "MICROVISION_PROVIDER",
                value,
                expected: "openai, gemini",
            })?,
            None => Provider::OpenAi,
        };

        let api_key = get(provider.key_var()).ok_or(ConfigError::Missing(provider.key_var()))?;

        let encoding = match get("MICROVISION_IMAGE_ENCODING") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "MICROVISION_IMAGE_ENCODING",
                value,
                expected: "data-uri, inline, remote-url",
            })?,
            None => ImageEncoding::default(),
        };

        let public_url = get("MICROVISION_PUBLIC_URL").map(|u| u.trim_end_matches('/').to_string());
        if encoding == ImageEncoding::RemoteUrl && public_url.is_none() {
            return Err(ConfigError::Missing("MICROVISION_PUBLIC_URL"));
        }

        let max_upload_bytes = match get("MICROVISION_MAX_UPLOAD_BYTES") {
            Some(value) => Some(value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MICROVISION_MAX_UPLOAD_BYTES",
                value,
                expected: "a byte count",
            })?),
            None => None,
        };

        Ok(Config {
            addr: get("MICROVISION_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            provider,
            api_key,
            model: get("MICROVISION_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            api_base: get("MICROVISION_API_BASE")
                .unwrap_or_else(|| provider.default_api_base().to_string())
                .trim_end_matches('/')
                .to_string(),
            encoding,
            public_url,
            max_upload_bytes,
        })
    }
}
