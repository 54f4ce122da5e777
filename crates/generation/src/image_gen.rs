use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backends::{GenerativeService, ImageRequest};
use crate::error::{Failure, GenerationError, Result};
use crate::media::MediaPayload;
use crate::prompts::{image_model_prompt, image_prompt, random_image_preset};

/// Terminal state of an image request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Completed {
        image: MediaPayload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Failed {
        error: Failure,
    },
}

impl ImageOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Re-imagines a memory as a stylised picture
#[derive(Clone)]
pub struct ImageGenerator {
    service: Arc<dyn GenerativeService>,
}

impl ImageGenerator {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    /// Prompt for a memory: the given preset, or a random one.
    pub fn memory_prompt(description: &str, preset: Option<&str>) -> String {
        let preset = preset
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| random_image_preset());
        image_prompt(preset, description)
    }

    pub async fn generate(&self, prompt: &str, reference: Option<MediaPayload>) -> ImageOutcome {
        match self.try_generate(prompt, reference).await {
            Ok((image, caption)) => ImageOutcome::Completed { image, caption },
            Err(err) => {
                log::warn!("Image generation failed: {}", err);
                ImageOutcome::Failed {
                    error: err.to_failure(),
                }
            }
        }
    }

    async fn try_generate(
        &self,
        prompt: &str,
        reference: Option<MediaPayload>,
    ) -> Result<(MediaPayload, Option<String>)> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::Validation(
                "Image ke liye prompt zaroori hai.".to_string(),
            ));
        }
        self.service.ensure_configured()?;

        let request = ImageRequest {
            prompt: image_model_prompt(prompt, reference.is_some()),
            reference,
        };
        let output = self.service.generate_image(&request).await?;
        let image = output
            .image
            .ok_or_else(|| GenerationError::MissingPayload("image".to_string()))?;
        log::info!(
            "Generated image via {} ({})",
            self.service.name(),
            image
        );
        Ok((image, output.caption))
    }
}
