/// Generation failures and their user-facing messages
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when no API credential is configured
pub const MSG_NOT_CONFIGURED: &str = "Admin ne API Key set nahi ki hai. Kripya unse sampark karein.";

/// Shown when the upstream account has no billing enabled
pub const MSG_BILLING: &str = "Image model istemaal karne ke liye aapke Google Cloud account par billing chalu hona zaroori hai. Kripya apne account settings check karein.";

/// Shown when the upstream rejects the credential
pub const MSG_CREDENTIAL: &str = "API Key sahi nahi hai. Kripya admin se nayi key set karne ko kahein.";

/// Shown when a wish could not be generated
pub const MSG_WISH_FAILED: &str = "Sandesh nahi ban paaya. Phir se koshish karein.";

/// Shown when polling gives up
pub const MSG_TIMEOUT: &str = "Video banne mein bahut der lag rahi hai. Kripya thodi der baad dobara koshish karein.";

/// Shown when the consumer stopped waiting
pub const MSG_CANCELLED: &str = "Video banana rok diya gaya.";

/// Fallback for upstream errors without any text
pub const MSG_UNKNOWN: &str = "Ek anjaan galti hui.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("generation service is not configured: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("billing not enabled upstream: {0}")]
    Billing(String),

    #[error("upstream rejected the credential: {0}")]
    Credential(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("response carried no {0}")]
    MissingPayload(String),

    #[error("gave up after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("cancelled")]
    Cancelled,
}

/// Coarse category of a `GenerationError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    Billing,
    Credential,
    Upstream,
    MissingPayload,
    Timeout,
    Cancelled,
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Billing(_) => ErrorKind::Billing,
            Self::Credential(_) => ErrorKind::Credential,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::MissingPayload(_) => ErrorKind::MissingPayload,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Message suitable for showing to the album owner. Never empty.
    pub fn user_message(&self) -> String {
        let msg = match self {
            Self::Configuration(_) => MSG_NOT_CONFIGURED.to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Billing(_) => MSG_BILLING.to_string(),
            Self::Credential(_) => MSG_CREDENTIAL.to_string(),
            Self::Upstream(msg) => msg.clone(),
            Self::MissingPayload(what) => format!("AI ne koi {} nahi diya.", what),
            Self::Timeout { .. } => MSG_TIMEOUT.to_string(),
            Self::Cancelled => MSG_CANCELLED.to_string(),
        };
        if msg.trim().is_empty() {
            MSG_UNKNOWN.to_string()
        } else {
            msg
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            message: self.user_message(),
        }
    }
}

/// Serializable terminal failure carried by outcome types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<GenerationError> for Failure {
    fn from(err: GenerationError) -> Self {
        err.to_failure()
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
