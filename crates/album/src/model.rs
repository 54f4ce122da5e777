use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AlbumError, Result};

/// Shortest description accepted from the edit form.
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Longest description accepted anywhere.
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Opaque memory identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(pub String);

impl MemoryId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single album entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: MemoryId,

    /// Remote URL or `data:<mime>;base64,...` URI
    pub image_url: String,

    pub image_description: String,

    /// Caption shown under the photo
    #[serde(default)]
    pub wish: String,

    /// Free text; usually a four digit year
    #[serde(default)]
    pub year: String,

    /// Display hint, degrees
    #[serde(default)]
    pub rotation: f32,

    /// Display hint
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Short hint for image search/placeholder services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_ai_hint: Option<String>,
}

fn default_scale() -> f32 {
    1.0
}

impl Memory {
    /// Build a memory from a validated draft, assigning a fresh id.
    pub fn from_draft(draft: MemoryDraft) -> Self {
        let hint = data_ai_hint(&draft.image_description);
        Self {
            id: MemoryId::new(),
            image_url: draft.image_url,
            image_description: draft.image_description,
            wish: draft.wish.unwrap_or_default(),
            year: draft.year,
            rotation: 0.0,
            scale: 1.0,
            data_ai_hint: hint,
        }
    }

    /// Apply an edit. A missing image keeps the current one.
    pub fn apply(&mut self, update: MemoryUpdate) {
        if let Some(desc) = update.image_description {
            self.data_ai_hint = data_ai_hint(&desc);
            self.image_description = desc;
        }
        if let Some(wish) = update.wish {
            self.wish = wish;
        }
        if let Some(year) = update.year {
            self.year = year;
        }
        if let Some(url) = update.image_url.filter(|u| !u.trim().is_empty()) {
            self.image_url = url;
        }
    }
}

/// Input for a new memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryDraft {
    pub image_url: String,
    pub image_description: String,
    #[serde(default)]
    pub wish: Option<String>,
    pub year: String,
}

impl MemoryDraft {
    pub fn new(image_url: impl Into<String>, description: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            image_description: description.into(),
            wish: None,
            year: year.into(),
        }
    }

    pub fn with_wish(mut self, wish: impl Into<String>) -> Self {
        self.wish = Some(wish.into());
        self
    }

    /// Album creation only needs a description and a year.
    pub fn validate(&self) -> Result<()> {
        if self.image_description.trim().is_empty() {
            return Err(AlbumError::Validation(
                "Kripya har yaad ke liye vivaran aur saal dein.".to_string(),
            ));
        }
        if self.year.trim().is_empty() {
            return Err(AlbumError::Validation(
                "Kripya har yaad ke liye vivaran aur saal dein.".to_string(),
            ));
        }
        validate_description_len(&self.image_description, 1)
    }
}

/// Partial edit of an existing memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUpdate {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_description: Option<String>,
    #[serde(default)]
    pub wish: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl MemoryUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(desc) = &self.image_description {
            validate_description_len(desc, MIN_DESCRIPTION_LEN)?;
        }
        if let Some(year) = &self.year {
            if year.trim().is_empty() {
                return Err(AlbumError::Validation("Saal khaali nahi ho sakta.".to_string()));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_description_len(desc: &str, min: usize) -> Result<()> {
    let len = desc.trim().chars().count();
    if len < min {
        return Err(AlbumError::Validation(
            "Kripya thoda aur vistaar se likhein.".to_string(),
        ));
    }
    if len > MAX_DESCRIPTION_LEN {
        return Err(AlbumError::Validation(format!(
            "Vivaran {} aksharon se zyada nahi ho sakta.",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

/// First two words of the description
pub fn data_ai_hint(description: &str) -> Option<String> {
    let hint = description
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ");
    if hint.is_empty() {
        None
    } else {
        Some(hint)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
    Unspecified,
}

impl Gender {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" | "girl" | "ladki" | "behen" => Gender::Female,
            "male" | "m" | "boy" | "ladka" | "bhai" => Gender::Male,
            _ => Gender::Unspecified,
        }
    }
}

/// Who made the album and for whom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumInfo {
    pub creator_name: String,
    pub sibling_name: String,
    pub creator_gender: String,
}

impl AlbumInfo {
    pub fn new(
        creator_name: impl Into<String>,
        sibling_name: impl Into<String>,
        creator_gender: impl Into<String>,
    ) -> Self {
        Self {
            creator_name: creator_name.into(),
            sibling_name: sibling_name.into(),
            creator_gender: creator_gender.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.creator_name.trim().is_empty()
            || self.sibling_name.trim().is_empty()
            || self.creator_gender.trim().is_empty()
        {
            return Err(AlbumError::Validation(
                "Kripya apna naam, bhai/behen ka naam aur apna gender chunein.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn gender(&self) -> Gender {
        Gender::parse(&self.creator_gender)
    }

    /// Greeting line for the album header
    pub fn greeting(&self) -> String {
        let creator = self.creator_name.trim();
        let sibling = self.sibling_name.trim();
        match self.gender() {
            Gender::Female => format!(
                "{}, tumhari behen {} ki taraf se Happy Raksha Bandhan!",
                sibling, creator
            ),
            Gender::Male => format!(
                "{}, tumhare bhai {} ki taraf se Happy Raksha Bandhan!",
                sibling, creator
            ),
            Gender::Unspecified => format!(
                "{} ke liye, {} ki taraf se Happy Raksha Bandhan!",
                sibling, creator
            ),
        }
    }
}
