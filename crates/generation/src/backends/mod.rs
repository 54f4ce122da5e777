/// Generative service abstraction
///
/// One trait covers the four round trips the album needs: a caption, a
/// stylised image, starting a video operation and checking on it. The
/// follow-up download of a finished video is part of the trait as well so
/// that it shares the same credential and error classification.

pub mod gemini;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use gemini::GeminiService;

use crate::error::Result;
use crate::media::MediaPayload;

/// Opaque name of a long-running upstream operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of one status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    /// Finished; `media_uri` is where the video can be fetched from
    Done { media_uri: Option<String> },
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Final instruction for the image model
    pub prompt: String,
    pub reference: Option<MediaPayload>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageOutput {
    pub image: Option<MediaPayload>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: MediaPayload,
    pub duration_secs: u32,
    pub aspect_ratio: String,
}

/// Generative service backend
///
/// Implementations classify upstream failures themselves, so every error
/// reaching a generator is already a `GenerationError` with a kind.
#[async_trait::async_trait]
pub trait GenerativeService: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Fails with a configuration error when no credential is set.
    /// Never touches the network.
    fn ensure_configured(&self) -> Result<()>;

    async fn generate_text(&self, prompt: &str) -> Result<String>;

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageOutput>;

    async fn start_video(&self, request: &VideoRequest) -> Result<OperationHandle>;

    async fn check_operation(&self, handle: &OperationHandle) -> Result<OperationStatus>;

    /// Fetch a finished video and return it inline
    async fn download_media(&self, uri: &str) -> Result<MediaPayload>;
}
