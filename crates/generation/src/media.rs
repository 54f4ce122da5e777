/// Images and videos exchanged with the generative service
///
/// Media travels either as a remote URL or inline as a base64 data URI
/// (`data:<mime>;base64,<data>`).
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GenerationError, Result};

pub const VIDEO_MP4: &str = "video/mp4";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MediaPayload {
    Url(String),
    DataUri { mime: String, data: String },
}

impl MediaPayload {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("data:") {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                GenerationError::Validation("data URI mein ',' nahi mila".to_string())
            })?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                GenerationError::Validation("sirf base64 data URI chalti hai".to_string())
            })?;
            if data.is_empty() {
                return Err(GenerationError::Validation("data URI khaali hai".to_string()));
            }
            let mime = if mime.is_empty() { OCTET_STREAM } else { mime };
            return Ok(Self::DataUri {
                mime: mime.to_string(),
                data: data.to_string(),
            });
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self::Url(raw.to_string()));
        }
        Err(GenerationError::Validation(
            "image ek URL ya data URI honi chahiye".to_string(),
        ))
    }

    /// Encode bytes inline. Without an explicit MIME type it is sniffed.
    pub fn from_bytes(bytes: &[u8], mime: Option<&str>) -> Self {
        let mime = mime
            .map(|m| m.to_string())
            .or_else(|| sniff_mime(bytes).map(|m| m.to_string()))
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        Self::DataUri {
            mime,
            data: STANDARD.encode(bytes),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::DataUri { .. })
    }

    pub fn mime(&self) -> Option<&str> {
        match self {
            Self::Url(_) => None,
            Self::DataUri { mime, .. } => Some(mime),
        }
    }

    /// `(mime, base64)` of an inline payload
    pub fn inline_parts(&self) -> Option<(&str, &str)> {
        match self {
            Self::Url(_) => None,
            Self::DataUri { mime, data } => Some((mime, data)),
        }
    }

    /// Raw bytes of an inline payload
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Url(url) => Err(GenerationError::Validation(format!(
                "{} inline data nahi hai",
                url
            ))),
            Self::DataUri { data, .. } => STANDARD
                .decode(data)
                .map_err(|e| GenerationError::Validation(format!("base64 galat hai: {}", e))),
        }
    }

    pub fn to_uri_string(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::DataUri { mime, data } => format!("data:{};base64,{}", mime, data),
        }
    }
}

/// MIME type of an image, from its magic bytes
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

impl fmt::Display for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::DataUri { mime, data } => write!(f, "<{} inline, {} bytes>", mime, data.len()),
        }
    }
}

impl TryFrom<String> for MediaPayload {
    type Error = GenerationError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<MediaPayload> for String {
    fn from(value: MediaPayload) -> Self {
        value.to_uri_string()
    }
}
