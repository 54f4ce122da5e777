/// REST API endpoints for the album
/// Handles album creation, memory CRUD, the year timeline, and generation
use album::{AlbumError, AlbumInfo, Memory, MemoryDraft, MemoryUpdate, YearGroup};
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use generation::{ImageGenerator, ImageOutcome, MediaPayload, VideoState, WishOutcome};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::models::*;
use crate::state::{AppState, VideoJob};

/// Photos travel inline as data URIs
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    Album(AlbumError),
    NotFound(String),
    BadRequest(String),
}

impl From<AlbumError> for ApiError {
    fn from(err: AlbumError) -> Self {
        ApiError::Album(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Album(AlbumError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Yaad nahi mili: {}", id))
            }
            ApiError::Album(AlbumError::NoAlbum) => (
                StatusCode::NOT_FOUND,
                "Abhi tak koi album nahi bana.".to_string(),
            ),
            ApiError::Album(AlbumError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Album(e) => {
                tracing::error!(error = %e, "album storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Storage error: {}", e))
            }
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {}", what)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Album
        .route("/api/album", get(get_album).post(create_album))
        // Memories
        .route("/api/memories", get(list_memories).post(add_memory))
        .route(
            "/api/memories/:id",
            get(get_memory).put(update_memory).delete(remove_memory),
        )
        .route("/api/timeline", get(timeline))
        // Generation
        .route("/api/wish", post(generate_wish))
        .route("/api/memories/:id/image", post(generate_image))
        .route(
            "/api/memories/:id/video",
            get(memory_video).post(start_video),
        )
        .route("/api/videos/:job", get(video_status).delete(cancel_video))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        // CORS for local development
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// POST /api/album - Create (or recreate) the album
pub async fn create_album(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAlbumRequest>,
) -> Result<(StatusCode, Json<CreatedAlbum>), ApiError> {
    let info = AlbumInfo::new(req.creator_name, req.sibling_name, req.creator_gender);
    let mut album = state.album.lock();
    let memories = album.create_album(info.clone(), req.memories)?.to_vec();

    Ok((
        StatusCode::CREATED,
        Json(CreatedAlbum {
            greeting: info.greeting(),
            info,
            memories,
        }),
    ))
}

/// GET /api/album - Album info; consumes the just-created flag
pub async fn get_album(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlbumResponse>, ApiError> {
    let mut album = state.album.lock();
    let info = album.info().cloned().ok_or(AlbumError::NoAlbum)?;
    let just_created = album.take_just_created()?;

    Ok(Json(AlbumResponse {
        greeting: info.greeting(),
        info,
        just_created,
        memory_count: album.len(),
    }))
}

/// GET /api/memories - All memories in insertion order
pub async fn list_memories(State(state): State<Arc<AppState>>) -> Json<Vec<Memory>> {
    Json(state.album.lock().memories().to_vec())
}

/// POST /api/memories - Add a memory
pub async fn add_memory(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<MemoryDraft>,
) -> Result<(StatusCode, Json<Memory>), ApiError> {
    let memory = state.album.lock().add(draft)?;
    Ok((StatusCode::CREATED, Json(memory)))
}

/// GET /api/memories/:id
pub async fn get_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Memory>, ApiError> {
    state
        .album
        .lock()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(ApiError::Album(AlbumError::NotFound(id)))
}

/// PUT /api/memories/:id - Edit; a missing image keeps the current one
pub async fn update_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<MemoryUpdate>,
) -> Result<Json<Memory>, ApiError> {
    let memory = state.album.lock().update(&id, update)?;
    Ok(Json(memory))
}

/// DELETE /api/memories/:id
pub async fn remove_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Memory>, ApiError> {
    let memory = state.album.lock().remove(&id)?;
    Ok(Json(memory))
}

/// GET /api/timeline - Memories grouped by year, newest first
pub async fn timeline(State(state): State<Arc<AppState>>) -> Json<Vec<YearGroup>> {
    Json(state.album.lock().timeline())
}

/// POST /api/wish - Generate a wish, optionally saving it on a memory
pub async fn generate_wish(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WishRequest>,
) -> Result<Json<WishOutcome>, ApiError> {
    if let Some(id) = &req.memory_id {
        if state.album.lock().get(id).is_none() {
            return Err(AlbumError::NotFound(id.clone()).into());
        }
    }

    let outcome = state.generators.wish.generate_outcome(&req.description).await;

    if let (WishOutcome::Completed { wish }, Some(id)) = (&outcome, &req.memory_id) {
        state.album.lock().set_wish(id, wish.clone())?;
        tracing::info!(memory = %id, "wish saved");
    }
    Ok(Json(outcome))
}

/// POST /api/memories/:id/image - Re-imagine a memory as a stylised image
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ImageBody>>,
) -> Result<Json<ImageOutcome>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or(ImageBody {
        preset: None,
        use_reference: true,
    });
    let memory = lookup(&state, &id)?;

    let prompt = ImageGenerator::memory_prompt(&memory.image_description, body.preset.as_deref());
    let reference = if body.use_reference {
        match MediaPayload::parse(&memory.image_url) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(memory = %id, error = %e, "photo unusable as reference");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(state.generators.image.generate(&prompt, reference).await))
}

/// POST /api/memories/:id/video - Start animating a memory photo
pub async fn start_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<VideoBody>>,
) -> Result<(StatusCode, Json<VideoJobResponse>), ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let memory = lookup(&state, &id)?;
    let image = MediaPayload::parse(&memory.image_url)
        .map_err(|e| ApiError::BadRequest(e.user_message()))?;

    let videos = &state.generators.video;
    let request = videos.memory_request(&memory.image_description, image, body.preset.as_deref());
    let task = videos.start(request);
    let job_id = Uuid::new_v4().to_string();
    let current = task.state();

    tracing::info!(job = %job_id, memory = %memory.id, "video job started");
    state.insert_job(
        job_id.clone(),
        VideoJob {
            memory_id: memory.id.clone(),
            task,
            started_at: chrono::Utc::now(),
        },
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(VideoJobResponse {
            job_id,
            memory_id: memory.id,
            state: current,
        }),
    ))
}

/// GET /api/memories/:id/video - Latest video job for a memory, `idle` if none
pub async fn memory_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MemoryVideoResponse>, ApiError> {
    let memory = lookup(&state, &id)?;
    let (job_id, current) = match state.latest_job_for(&memory.id) {
        Some((job_id, current)) => (Some(job_id), current),
        None => (None, VideoState::Idle),
    };
    Ok(Json(MemoryVideoResponse {
        memory_id: memory.id,
        job_id,
        state: current,
    }))
}

/// GET /api/videos/:job - Current state of a video job
pub async fn video_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<VideoJobResponse>, ApiError> {
    let (memory_id, current) = state
        .job_state(&job_id)
        .ok_or_else(|| ApiError::NotFound(format!("video job {}", job_id)))?;
    Ok(Json(VideoJobResponse {
        job_id,
        memory_id,
        state: current,
    }))
}

/// DELETE /api/videos/:job - Stop polling and forget the job
pub async fn cancel_video(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<VideoJobResponse>, ApiError> {
    let (memory_id, last) = state
        .remove_job(&job_id)
        .ok_or_else(|| ApiError::NotFound(format!("video job {}", job_id)))?;
    tracing::info!(job = %job_id, state = last.label(), "video job removed");
    Ok(Json(VideoJobResponse {
        job_id,
        memory_id,
        state: last,
    }))
}

fn lookup(state: &AppState, id: &str) -> Result<Memory, ApiError> {
    state
        .album
        .lock()
        .get(id)
        .cloned()
        .ok_or_else(|| AlbumError::NotFound(id.to_string()).into())
}
