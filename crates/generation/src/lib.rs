/// Generative features for the Raksha Bandhan album
///
/// Wishes, stylised images and animated clips, each produced through a
/// `GenerativeService` backend and reported as a closed outcome type.

pub mod backends;
pub mod classify;
pub mod config;
pub mod error;
pub mod image_gen;
pub mod media;
pub mod prompts;
pub mod video;
pub mod wish;

pub use backends::{
    GeminiService, GenerativeService, ImageOutput, ImageRequest, OperationHandle,
    OperationStatus, VideoRequest,
};
pub use classify::{ClassificationRules, ErrorRule, UpstreamCategory, UpstreamError};
pub use config::GenerationConfig;
pub use error::{ErrorKind, Failure, GenerationError, Result};
pub use image_gen::{ImageGenerator, ImageOutcome};
pub use media::MediaPayload;
pub use video::{PollPolicy, VideoGenerator, VideoState, VideoTask};
pub use wish::{WishGenerator, WishOutcome};

use std::sync::Arc;

/// The three generators sharing one backend
#[derive(Clone)]
pub struct Generators {
    pub wish: WishGenerator,
    pub image: ImageGenerator,
    pub video: VideoGenerator,
}

impl Generators {
    pub fn new(service: Arc<dyn GenerativeService>, config: &GenerationConfig) -> Self {
        Self {
            wish: WishGenerator::new(service.clone()),
            image: ImageGenerator::new(service.clone()),
            video: VideoGenerator::new(service, config),
        }
    }

    /// Generators backed by Gemini, configured from the environment.
    pub fn gemini_from_env() -> anyhow::Result<Self> {
        let config = GenerationConfig::from_env()?;
        if config.api_key.is_none() {
            log::warn!("GEMINI_API_KEY is not set; generation requests will fail");
        }
        let service: Arc<dyn GenerativeService> = Arc::new(GeminiService::new(config.clone())?);
        Ok(Self::new(service, &config))
    }
}
