/// Generation service configuration
///
/// Layering: defaults, then an optional JSON file, then environment.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::classify::ClassificationRules;
use crate::error::GenerationError;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API key for the generative service
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL, without trailing slash
    pub api_url: String,

    pub text_model: String,
    pub image_model: String,
    pub video_model: String,

    /// Length of generated videos
    pub video_duration_secs: u32,

    /// e.g. "16:9"
    pub video_aspect_ratio: String,

    /// Delay between operation status checks
    pub poll_interval_secs: u64,

    /// Status checks before a video job fails with a timeout
    pub max_poll_attempts: u32,

    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,

    /// How upstream errors are sorted into billing/credential/other
    pub classification: ClassificationRules,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            video_duration_secs: 5,
            video_aspect_ratio: "16:9".to_string(),
            poll_interval_secs: 5,
            max_poll_attempts: 120,
            request_timeout_secs: 120,
            classification: ClassificationRules::default(),
        }
    }
}

impl GenerationConfig {
    /// Defaults, then `GENERATION_CONFIG` (a JSON file) if set, then env vars.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("GENERATION_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(url) = non_empty("GENERATION_API_URL") {
            self.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = non_empty("GENERATION_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("GENERATION_POLL_INTERVAL_SECS={secs}"))?;
        }
        if let Some(n) = non_empty("GENERATION_MAX_POLL_ATTEMPTS") {
            self.max_poll_attempts = n
                .trim()
                .parse()
                .with_context(|| format!("GENERATION_MAX_POLL_ATTEMPTS={n}"))?;
        }
        self.validate()
    }

    /// Polling needs a non-zero interval and at least one status check.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.max_poll_attempts == 0 {
            bail!("max_poll_attempts must be at least 1");
        }
        Ok(())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The key, or a configuration error when it is missing or blank.
    pub fn require_api_key(&self) -> std::result::Result<&str, GenerationError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(GenerationError::Configuration(
                "GEMINI_API_KEY is not set".to_string(),
            )),
        }
    }

    /// Save configuration to JSON. The API key is never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading generation config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)?;
        config
            .validate()
            .with_context(|| format!("invalid generation config {}", path.display()))?;
        Ok(config)
    }
}
