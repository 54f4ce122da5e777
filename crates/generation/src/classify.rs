/// Sorting upstream errors into billing / credential / generic
///
/// Structured reasons from the error body are matched first; message
/// substrings are only consulted when no reason matched.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GenerationError;

/// Error reported by the generative service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamError {
    /// HTTP status, when the failure came from an HTTP response
    pub http_status: Option<u16>,

    /// google.rpc code from the error object, e.g. 3 for `INVALID_ARGUMENT`
    pub code: Option<i64>,

    /// RPC status string, e.g. `INVALID_ARGUMENT`
    pub status: Option<String>,

    /// `reason` fields from the error details
    pub reasons: Vec<String>,

    pub message: String,
}

impl UpstreamError {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Parse a Google-style `{"error": {...}}` body. Non-JSON bodies become
    /// the message verbatim.
    pub fn from_body(http_status: Option<u16>, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(v) if v.get("error").is_some() => Self::from_error_value(http_status, &v["error"]),
            _ => {
                let message = if body.trim().is_empty() {
                    match http_status {
                        Some(code) => format!("HTTP {}", code),
                        None => String::new(),
                    }
                } else {
                    body.trim().to_string()
                };
                Self {
                    http_status,
                    message,
                    ..Default::default()
                }
            }
        }
    }

    /// Parse the `error` object of a response or an operation.
    pub fn from_error_value(http_status: Option<u16>, error: &Value) -> Self {
        let message = error["message"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string());
        let status = error["status"].as_str().map(|s| s.to_string());
        let reasons = error["details"]
            .as_array()
            .map(|details| {
                details
                    .iter()
                    .filter_map(|d| d["reason"].as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            http_status,
            code: error["code"].as_i64(),
            status,
            reasons,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamCategory {
    Billing,
    Credential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRule {
    pub category: UpstreamCategory,

    /// Exact `reason` codes (case-insensitive)
    #[serde(default)]
    pub reasons: Vec<String>,

    /// Message fragments (case-insensitive)
    #[serde(default)]
    pub substrings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRules {
    pub rules: Vec<ErrorRule>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            rules: vec![
                ErrorRule {
                    category: UpstreamCategory::Billing,
                    reasons: vec!["BILLING_DISABLED".into(), "BILLING_NOT_ENABLED".into()],
                    substrings: vec!["billing".into(), "billed users".into()],
                },
                ErrorRule {
                    category: UpstreamCategory::Credential,
                    reasons: vec!["API_KEY_INVALID".into(), "API_KEY_EXPIRED".into()],
                    substrings: vec!["API key not valid".into(), "API_KEY_INVALID".into()],
                },
            ],
        }
    }
}

impl ClassificationRules {
    pub fn category_of(&self, err: &UpstreamError) -> Option<UpstreamCategory> {
        let structured = self.rules.iter().find(|rule| {
            rule.reasons
                .iter()
                .any(|r| err.reasons.iter().any(|er| er.eq_ignore_ascii_case(r)))
        });
        if let Some(rule) = structured {
            return Some(rule.category);
        }

        let message = err.message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| {
                rule.substrings
                    .iter()
                    .any(|s| !s.is_empty() && message.contains(&s.to_lowercase()))
            })
            .map(|rule| rule.category)
    }

    pub fn classify(&self, err: &UpstreamError) -> GenerationError {
        match self.category_of(err) {
            Some(UpstreamCategory::Billing) => GenerationError::Billing(err.message.clone()),
            Some(UpstreamCategory::Credential) => GenerationError::Credential(err.message.clone()),
            None => GenerationError::Upstream(err.message.clone()),
        }
    }
}
