/// Gemini REST backend
///
/// Text and images go through `generateContent`; videos through Veo's
/// `predictLongRunning` plus operation polling.
use serde_json::{json, Value};

use super::{
    GenerativeService, ImageOutput, ImageRequest, OperationHandle, OperationStatus, VideoRequest,
};
use crate::classify::UpstreamError;
use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::media::{MediaPayload, VIDEO_MP4};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiService {
    config: GenerationConfig,
    client: reqwest::Client,
}

impl GeminiService {
    pub fn new(config: GenerationConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_url, model, method)
    }

    fn classify(&self, err: UpstreamError) -> GenerationError {
        let classified = self.config.classification.classify(&err);
        log::warn!(
            "Gemini error (http {:?}, code {:?}, status {:?}, reasons {:?}): {}",
            err.http_status,
            err.code,
            err.status,
            err.reasons,
            err.message
        );
        classified
    }

    fn transport(&self, err: reqwest::Error) -> GenerationError {
        // Download URLs carry the key as a query parameter
        self.classify(UpstreamError::from_message(err.without_url().to_string()))
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport(e))?;
        if !status.is_success() {
            return Err(self.classify(UpstreamError::from_body(Some(status.as_u16()), &body)));
        }
        serde_json::from_str(&body).map_err(|e| {
            GenerationError::Upstream(format!("unreadable response from Gemini: {}", e))
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let key = self.config.require_api_key()?;
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.read_json(response).await
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let key = self.config.require_api_key()?;
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, key)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.read_json(response).await
    }

    /// Turn a reference into `(mime, base64)`, fetching remote images first.
    async fn inline(&self, media: &MediaPayload) -> Result<(String, String)> {
        match media {
            MediaPayload::DataUri { mime, data } => Ok((mime.clone(), data.clone())),
            MediaPayload::Url(url) => {
                log::debug!("Fetching reference image {}", url);
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| self.transport(e))?;
                if !response.status().is_success() {
                    return Err(GenerationError::Upstream(format!(
                        "reference image download failed: {}",
                        response.status()
                    )));
                }
                let bytes = response.bytes().await.map_err(|e| self.transport(e))?;
                let payload = MediaPayload::from_bytes(&bytes, None);
                payload
                    .inline_parts()
                    .map(|(mime, data)| (mime.to_string(), data.to_string()))
                    .ok_or_else(|| {
                        GenerationError::Validation("reference image khaali hai".to_string())
                    })
            }
        }
    }
}

/// Refusals come back as 200 with no candidates and a block reason.
fn blocked_reason(body: &Value) -> Option<String> {
    body["promptFeedback"]["blockReason"]
        .as_str()
        .map(|reason| format!("Request blocked by safety filters: {}", reason))
}

fn response_parts(body: &Value) -> Vec<Value> {
    body["candidates"][0]["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default()
}

fn collect_text(parts: &[Value]) -> String {
    parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

fn video_uri(operation: &Value) -> Option<String> {
    let response = &operation["response"];
    response["generateVideoResponse"]["generatedSamples"][0]["video"]["uri"]
        .as_str()
        .or_else(|| response["generatedVideos"][0]["video"]["uri"].as_str())
        .map(|s| s.to_string())
}

fn filtered_reasons(operation: &Value) -> Option<String> {
    let reasons = operation["response"]["generateVideoResponse"]["raiMediaFilteredReasons"]
        .as_array()?
        .iter()
        .filter_map(|r| r.as_str())
        .collect::<Vec<_>>();
    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join(" "))
    }
}

#[async_trait::async_trait]
impl GenerativeService for GeminiService {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn ensure_configured(&self) -> Result<()> {
        self.config.require_api_key().map(|_| ())
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let url = self.model_url(&self.config.text_model, "generateContent");
        log::debug!("Requesting text from {}", self.config.text_model);

        let response = self.post_json(&url, &body).await?;
        if let Some(reason) = blocked_reason(&response) {
            return Err(GenerationError::Upstream(reason));
        }
        Ok(collect_text(&response_parts(&response)))
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageOutput> {
        let mut parts = vec![json!({ "text": request.prompt })];
        if let Some(reference) = &request.reference {
            let (mime, data) = self.inline(reference).await?;
            log::debug!("Attaching {} reference ({} bytes encoded)", mime, data.len());
            parts.push(json!({ "inlineData": { "mimeType": mime, "data": data } }));
        }
        let body = json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        });
        let url = self.model_url(&self.config.image_model, "generateContent");
        log::info!("Requesting image from {}", self.config.image_model);

        let response = self.post_json(&url, &body).await?;
        if let Some(reason) = blocked_reason(&response) {
            return Err(GenerationError::Upstream(reason));
        }

        let parts = response_parts(&response);
        let image = parts.iter().find_map(|p| {
            let inline = &p["inlineData"];
            match (inline["mimeType"].as_str(), inline["data"].as_str()) {
                (Some(mime), Some(data)) if !data.is_empty() => Some(MediaPayload::DataUri {
                    mime: mime.to_string(),
                    data: data.to_string(),
                }),
                _ => None,
            }
        });
        let caption = Some(collect_text(&parts)).filter(|c| !c.is_empty());
        Ok(ImageOutput { image, caption })
    }

    async fn start_video(&self, request: &VideoRequest) -> Result<OperationHandle> {
        let (mime, data) = self.inline(&request.image).await?;
        let body = json!({
            "instances": [{
                "prompt": request.prompt,
                "image": { "bytesBase64Encoded": data, "mimeType": mime }
            }],
            "parameters": {
                "durationSeconds": request.duration_secs,
                "aspectRatio": request.aspect_ratio
            }
        });
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        log::info!(
            "Starting {}s video on {}",
            request.duration_secs,
            self.config.video_model
        );

        let response = self.post_json(&url, &body).await?;
        match response["name"].as_str().filter(|n| !n.is_empty()) {
            Some(name) => Ok(OperationHandle(name.to_string())),
            None => Err(GenerationError::MissingPayload("operation".to_string())),
        }
    }

    async fn check_operation(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        let url = format!("{}/{}", self.config.api_url, handle.as_str());
        let operation = self.get_json(&url).await?;

        if operation.get("error").map_or(false, |e| !e.is_null()) {
            return Err(self.classify(UpstreamError::from_error_value(None, &operation["error"])));
        }
        if !operation["done"].as_bool().unwrap_or(false) {
            return Ok(OperationStatus::Pending);
        }

        let media_uri = video_uri(&operation);
        if media_uri.is_none() {
            if let Some(reasons) = filtered_reasons(&operation) {
                return Err(GenerationError::Upstream(reasons));
            }
        }
        log::info!("Operation {} finished", handle);
        Ok(OperationStatus::Done { media_uri })
    }

    async fn download_media(&self, uri: &str) -> Result<MediaPayload> {
        let key = self.config.require_api_key()?;
        let response = self
            .client
            .get(uri)
            .query(&[("key", key)])
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify(UpstreamError::from_body(Some(status.as_u16()), &body)));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or(VIDEO_MP4)
            .to_string();
        let bytes = response.bytes().await.map_err(|e| self.transport(e))?;
        if bytes.is_empty() {
            return Err(GenerationError::MissingPayload("video".to_string()));
        }
        log::info!("Downloaded {} ({} bytes)", mime, bytes.len());
        Ok(MediaPayload::from_bytes(&bytes, Some(&mime)))
    }
}
