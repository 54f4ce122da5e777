use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backends::GenerativeService;
use crate::error::{ErrorKind, Failure, GenerationError, Result, MSG_WISH_FAILED};
use crate::prompts::wish_prompt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WishOutcome {
    Completed { wish: String },
    Failed { error: Failure },
}

/// Writes a Raksha Bandhan caption for one photo description
#[derive(Clone)]
pub struct WishGenerator {
    service: Arc<dyn GenerativeService>,
}

impl WishGenerator {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    /// One upstream call; no retries.
    pub async fn generate(&self, description: &str) -> Result<String> {
        let description = description.trim();
        if description.is_empty() {
            return Err(GenerationError::Validation(
                "Photo ka vivaran zaroori hai.".to_string(),
            ));
        }
        self.service.ensure_configured()?;

        let wish = self.service.generate_text(&wish_prompt(description)).await?;
        let wish = wish.trim();
        if wish.is_empty() {
            return Err(GenerationError::MissingPayload("sandesh".to_string()));
        }
        log::info!("Generated wish via {} ({} chars)", self.service.name(), wish.len());
        Ok(wish.to_string())
    }

    /// Like `generate`, but as a closed outcome. Generic upstream failures
    /// are reported with a single friendly message.
    pub async fn generate_outcome(&self, description: &str) -> WishOutcome {
        match self.generate(description).await {
            Ok(wish) => WishOutcome::Completed { wish },
            Err(err) => {
                log::warn!("Wish generation failed: {}", err);
                let mut error = err.to_failure();
                if matches!(error.kind, ErrorKind::Upstream | ErrorKind::MissingPayload) {
                    error.message = MSG_WISH_FAILED.to_string();
                }
                WishOutcome::Failed { error }
            }
        }
    }

    /// Generated wish, or `fallback` when anything goes wrong.
    pub async fn generate_or_fallback(&self, description: &str, fallback: &str) -> String {
        match self.generate(description).await {
            Ok(wish) => wish,
            Err(err) => {
                log::warn!("Using fallback wish: {}", err);
                fallback.to_string()
            }
        }
    }
}
