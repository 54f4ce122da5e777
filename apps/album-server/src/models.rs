/// Request and response bodies for the album API
use album::{AlbumInfo, Memory, MemoryDraft, MemoryId};
use generation::VideoState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbumRequest {
    pub creator_name: String,
    pub sibling_name: String,
    pub creator_gender: String,
    pub memories: Vec<MemoryDraft>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResponse {
    pub info: AlbumInfo,
    pub greeting: String,

    /// True only on the first read after creation
    pub just_created: bool,

    pub memory_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAlbum {
    pub info: AlbumInfo,
    pub greeting: String,
    pub memories: Vec<Memory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishRequest {
    pub description: String,

    /// When set, a generated wish is saved on this memory
    #[serde(default)]
    pub memory_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBody {
    /// One of the image presets; random when absent
    #[serde(default)]
    pub preset: Option<String>,

    /// Send the memory photo along as a likeness reference
    #[serde(default = "default_true")]
    pub use_reference: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoBody {
    /// One of the animation presets; random when absent
    #[serde(default)]
    pub preset: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobResponse {
    pub job_id: String,
    pub memory_id: MemoryId,
    pub state: VideoState,
}

/// Video status of one memory; `jobId` is null while idle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryVideoResponse {
    pub memory_id: MemoryId,
    pub job_id: Option<String>,
    pub state: VideoState,
}

fn default_true() -> bool {
    true
}
