use album::{AlbumStore, InMemoryStore};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use generation::*;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::api::router;
use crate::state::{AppState, SharedStore};

/// Answers every call at once; video operations stay pending until
/// `finish_after` checks.
struct StubService {
    checks: AtomicUsize,
    finish_after: usize,
}

#[async_trait::async_trait]
impl GenerativeService for StubService {
    fn name(&self) -> &str {
        "stub"
    }

    fn ensure_configured(&self) -> generation::Result<()> {
        Ok(())
    }

    async fn generate_text(&self, _prompt: &str) -> generation::Result<String> {
        Ok("Tum meri sabse pyaari behen ho!".to_string())
    }

    async fn generate_image(&self, request: &ImageRequest) -> generation::Result<ImageOutput> {
        if request.reference.is_none() {
            return Err(GenerationError::Billing("billing".to_string()));
        }
        Ok(ImageOutput {
            image: Some(MediaPayload::from_bytes(b"\x89PNG\r\n\x1a\n", None)),
            caption: None,
        })
    }

    async fn start_video(&self, _request: &VideoRequest) -> generation::Result<OperationHandle> {
        Ok(OperationHandle("operations/stub".to_string()))
    }

    async fn check_operation(
        &self,
        _handle: &OperationHandle,
    ) -> generation::Result<OperationStatus> {
        let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.finish_after {
            Ok(OperationStatus::Done {
                media_uri: Some("https://files.example/clip".to_string()),
            })
        } else {
            Ok(OperationStatus::Pending)
        }
    }

    async fn download_media(&self, _uri: &str) -> generation::Result<MediaPayload> {
        Ok(MediaPayload::from_bytes(b"mp4", Some("video/mp4")))
    }
}

fn app(finish_after: usize) -> Router {
    let store: SharedStore = Box::new(InMemoryStore::new());
    let album = AlbumStore::open(store).unwrap();
    let service = Arc::new(StubService {
        checks: AtomicUsize::new(0),
        finish_after,
    });
    let config = GenerationConfig::default();
    let mut generators = Generators::new(service, &config);
    generators.video = generators
        .video
        .with_policy(PollPolicy::new(Duration::from_millis(5), 50));
    router(Arc::new(AppState::new(album, generators)))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/album",
        Some(json!({
            "creatorName": "Priya",
            "siblingName": "Rahul",
            "creatorGender": "female",
            "memories": [
                {"imageUrl": "data:image/png;base64,iVBORw0KGgo=", "imageDescription": "Rakhi 2020", "year": "2020"},
                {"imageUrl": "https://placehold.co/600x400.png", "imageDescription": "Bachpan", "year": "Purani Yaadein"},
                {"imageUrl": "https://placehold.co/600x400.png", "imageDescription": "Holi 2019", "year": "2019"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_album_lifecycle() {
    let app = app(1);

    let (status, _) = send(&app, "GET", "/api/album", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = create(&app).await;
    assert_eq!(created["memories"].as_array().unwrap().len(), 3);
    assert_eq!(
        created["greeting"],
        "Rahul, tumhari behen Priya ki taraf se Happy Raksha Bandhan!"
    );

    let (_, first) = send(&app, "GET", "/api/album", None).await;
    assert_eq!(first["justCreated"], true);
    assert_eq!(first["memoryCount"], 3);
    let (_, second) = send(&app, "GET", "/api/album", None).await;
    assert_eq!(second["justCreated"], false);

    let (_, timeline) = send(&app, "GET", "/api/timeline", None).await;
    let labels: Vec<_> = timeline
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(labels, vec!["2020", "2019", "Purani Yaadein"]);
}

#[tokio::test]
async fn test_create_album_requires_memories() {
    let app = app(1);
    let (status, body) = send(
        &app,
        "POST",
        "/api/album",
        Some(json!({
            "creatorName": "Priya",
            "siblingName": "Rahul",
            "creatorGender": "female",
            "memories": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn test_memory_crud() {
    let app = app(1);

    let (status, added) = send(
        &app,
        "POST",
        "/api/memories",
        Some(json!({"imageUrl": "https://placehold.co/a.png", "imageDescription": "Mithai khate hue", "year": "2022"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = added["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(added["dataAiHint"], "Mithai khate");

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/memories/{}", id),
        Some(json!({"imageDescription": "Mithai khate hue, 2022 mein", "wish": "Meetha rishta"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["imageUrl"], "https://placehold.co/a.png");
    assert_eq!(updated["wish"], "Meetha rishta");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/memories/{}", id),
        Some(json!({"imageDescription": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/api/memories/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", &format!("/api/memories/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, "GET", "/api/memories", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_wish_saved_on_memory() {
    let app = app(1);
    let created = create(&app).await;
    let id = created["memories"][0]["id"].as_str().unwrap().to_string();

    let (status, outcome) = send(
        &app,
        "POST",
        "/api/wish",
        Some(json!({"description": "Rakhi 2020", "memoryId": id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], "completed");

    let (_, memory) = send(&app, "GET", &format!("/api/memories/{}", id), None).await;
    assert_eq!(memory["wish"], "Tum meri sabse pyaari behen ho!");

    let (_, failed) = send(&app, "POST", "/api/wish", Some(json!({"description": "  "}))).await;
    assert_eq!(failed["status"], "failed");
    assert_eq!(failed["error"]["kind"], "validation");
}

#[tokio::test]
async fn test_image_outcomes() {
    let app = app(1);
    let created = create(&app).await;
    let id = created["memories"][0]["id"].as_str().unwrap().to_string();

    let (status, ok) = send(&app, "POST", &format!("/api/memories/{}/image", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ok["status"], "completed");
    assert!(ok["image"].as_str().unwrap().starts_with("data:image/png;base64,"));

    let (_, failed) = send(
        &app,
        "POST",
        &format!("/api/memories/{}/image", id),
        Some(json!({"useReference": false})),
    )
    .await;
    assert_eq!(failed["status"], "failed");
    assert_eq!(failed["error"]["kind"], "billing");
}

#[tokio::test]
async fn test_video_job_completes() {
    let app = app(3);
    let created = create(&app).await;
    let id = created["memories"][0]["id"].as_str().unwrap().to_string();

    let (status, idle) = send(&app, "GET", &format!("/api/memories/{}/video", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(idle["state"]["status"], "idle");
    assert!(idle["jobId"].is_null());

    let (status, job) = send(&app, "POST", &format!("/api/memories/{}/video", id), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = job["jobId"].as_str().unwrap().to_string();

    let (_, latest) = send(&app, "GET", &format!("/api/memories/{}/video", id), None).await;
    assert_eq!(latest["jobId"], job_id.as_str());

    let mut last = Value::Null;
    for _ in 0..100 {
        let (_, body) = send(&app, "GET", &format!("/api/videos/{}", job_id), None).await;
        last = body;
        if last["state"]["status"] == "completed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(last["state"]["status"], "completed");
    assert!(last["state"]["video"]
        .as_str()
        .unwrap()
        .starts_with("data:video/mp4;base64,"));

    let (status, _) = send(&app, "DELETE", &format!("/api/videos/{}", job_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/videos/{}", job_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_cancel_while_processing() {
    let app = app(usize::MAX);
    let created = create(&app).await;
    let id = created["memories"][0]["id"].as_str().unwrap().to_string();

    let (_, job) = send(&app, "POST", &format!("/api/memories/{}/video", id), None).await;
    let job_id = job["jobId"].as_str().unwrap().to_string();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, cancelled) = send(&app, "DELETE", &format!("/api/videos/{}", job_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["state"]["status"], "failed");
    assert_eq!(cancelled["state"]["error"]["kind"], "cancelled");
}

#[tokio::test]
async fn test_video_needs_usable_photo() {
    let app = app(1);
    let (_, added) = send(
        &app,
        "POST",
        "/api/memories",
        Some(json!({"imageUrl": "photo.png", "imageDescription": "Local file", "year": "2021"})),
    )
    .await;
    let id = added["id"].as_str().unwrap();

    let (status, _) = send(&app, "POST", &format!("/api/memories/{}/video", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/memories/nope/video", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/api/memories/nope/video", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
