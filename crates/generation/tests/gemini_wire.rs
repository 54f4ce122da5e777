/// GeminiService against a local stand-in for the REST API
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use generation::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const KEY: &str = "test-key";

#[derive(Clone)]
struct Fake {
    base: String,
    checks: Arc<AtomicUsize>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) == Some(KEY)
}

fn key_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": {
            "code": 400,
            "message": "API key not valid. Please pass a valid API key.",
            "status": "INVALID_ARGUMENT",
            "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]
        }})),
    )
}

async fn model_call(
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return key_error();
    }
    match call.split_once(':') {
        Some((_, "generateContent")) if body["generationConfig"].is_null() => (
            StatusCode::OK,
            Json(json!({"candidates": [{"content": {"parts": [
                {"text": "Rakhi ka dhaaga, "}, {"text": "pyaar ka vaada."}
            ]}}]})),
        ),
        Some((_, "generateContent")) => {
            if body["contents"][0]["parts"][1]["inlineData"]["mimeType"] == "image/png" {
                (
                    StatusCode::OK,
                    Json(json!({"candidates": [{"content": {"parts": [
                        {"text": "Ek jaadui yaad"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]}}]})),
                )
            } else {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": {
                        "code": 403,
                        "message": "Imagen API is only accessible to billed users at this time.",
                        "status": "FAILED_PRECONDITION"
                    }})),
                )
            }
        }
        Some((_, "predictLongRunning")) => {
            assert_eq!(body["parameters"]["durationSeconds"], 5);
            assert_eq!(body["parameters"]["aspectRatio"], "16:9");
            assert_eq!(body["instances"][0]["image"]["mimeType"], "image/png");
            (StatusCode::OK, Json(json!({"name": "operations/op-1"})))
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

async fn operation(
    State(fake): State<Fake>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return key_error();
    }
    assert_eq!(id, "op-1");
    let n = fake.checks.fetch_add(1, Ordering::SeqCst) + 1;
    if n < 3 {
        return (StatusCode::OK, Json(json!({"name": "operations/op-1"})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "name": "operations/op-1",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": format!("{}/files/clip?alt=media", fake.base)}}
            ]}}
        })),
    )
}

async fn download(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if query.get("key").map(String::as_str) != Some(KEY) || query.get("alt").is_none() {
        return (StatusCode::FORBIDDEN, [("content-type", "text/plain")], Vec::new());
    }
    (
        StatusCode::OK,
        [("content-type", "video/mp4")],
        b"\0\0\0\x18ftypmp42".to_vec(),
    )
}

async fn spawn_fake() -> (String, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let checks = Arc::new(AtomicUsize::new(0));
    let fake = Fake {
        base: base.clone(),
        checks: checks.clone(),
    };
    let app = Router::new()
        .route("/v1beta/models/:call", post(model_call))
        .route("/v1beta/operations/:id", get(operation))
        .route("/files/clip", get(download))
        .with_state(fake);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base, checks)
}

fn config(base: &str, key: &str) -> GenerationConfig {
    GenerationConfig::default()
        .with_api_url(format!("{}/v1beta", base))
        .with_api_key(key)
}

#[tokio::test]
async fn test_text_round_trip() {
    let (base, _) = spawn_fake().await;
    let service = Arc::new(GeminiService::new(config(&base, KEY)).unwrap());

    let wish = WishGenerator::new(service)
        .generate("Ek bhai aur behen haste hue.")
        .await
        .unwrap();
    assert_eq!(wish, "Rakhi ka dhaaga, pyaar ka vaada.");
}

#[tokio::test]
async fn test_invalid_key_is_credential_error() {
    let (base, _) = spawn_fake().await;
    let service = Arc::new(GeminiService::new(config(&base, "wrong")).unwrap());

    let err = WishGenerator::new(service)
        .generate("Rakhi 2020")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Credential);
    assert_eq!(err.user_message(), generation::error::MSG_CREDENTIAL);
}

#[tokio::test]
async fn test_image_with_reference_and_billing_error() {
    let (base, _) = spawn_fake().await;
    let service = Arc::new(GeminiService::new(config(&base, KEY)).unwrap());
    let images = ImageGenerator::new(service);

    let reference = MediaPayload::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
    match images.generate("watercolor", Some(reference)).await {
        ImageOutcome::Completed { image, caption } => {
            assert_eq!(image.to_uri_string(), "data:image/png;base64,iVBORw0KGgo=");
            assert_eq!(caption.as_deref(), Some("Ek jaadui yaad"));
        }
        other => panic!("expected completion, got {:?}", other),
    }

    match images.generate("watercolor", None).await {
        ImageOutcome::Failed { error } => assert_eq!(error.kind, ErrorKind::Billing),
        other => panic!("expected billing failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_video_polls_then_downloads() {
    let (base, checks) = spawn_fake().await;
    let config = config(&base, KEY);
    let service = Arc::new(GeminiService::new(config.clone()).unwrap());
    let videos = VideoGenerator::new(service, &config)
        .with_policy(PollPolicy::new(Duration::from_millis(10), 20));

    let photo = MediaPayload::from_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR", None);
    let task = videos.start(videos.memory_request("Rakhi 2020", photo, None));

    match task.wait().await {
        VideoState::Completed { video } => {
            assert_eq!(video.mime(), Some("video/mp4"));
            assert_eq!(video.decode_bytes().unwrap(), b"\0\0\0\x18ftypmp42");
        }
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(checks.load(Ordering::SeqCst), 3);
}
