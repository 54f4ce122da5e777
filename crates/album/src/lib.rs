/// Raksha Bandhan memory album
///
/// Memories (photo + description + wish + year), album metadata, and the
/// record stores they are persisted through.
use std::path::PathBuf;
use thiserror::Error;

mod model;
pub use model::*;

mod record_store;
pub use record_store::*;

mod sqlite;
pub use sqlite::SqliteStore;

mod store;
pub use store::*;

pub mod timeline;
pub use timeline::{group_by_year, YearGroup, FALLBACK_YEAR};

mod wishes;
pub use wishes::{default_wishes, random_default_wish};

/// Key holding the serialized `AlbumInfo`.
pub const ALBUM_INFO_KEY: &str = "raksha-bandhan-album-info";

/// Key holding the serialized list of memories.
pub const MEMORIES_KEY: &str = "raksha-bandhan-memories";

/// One-shot flag set when an album is created, cleared on first display.
pub const JUST_CREATED_KEY: &str = "raksha-bandhan-album-created";

pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    base.join("rakhi_album")
}

#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("memory not found: {0}")]
    NotFound(String),

    #[error("album has not been created yet")]
    NoAlbum,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlbumError {
    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AlbumError::NotFound(_) | AlbumError::NoAlbum | AlbumError::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AlbumError>;
