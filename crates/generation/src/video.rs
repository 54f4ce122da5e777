/// Video generation and operation polling
///
/// `VideoGenerator::start` submits the job and spawns one polling task.
/// The task checks the operation once per interval, publishes every state
/// change on a watch channel, and stops at the first terminal state. The
/// returned `VideoTask` owns that task: cancelling it or dropping it aborts
/// the polling.
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use crate::backends::{GenerativeService, OperationStatus, VideoRequest};
use crate::config::GenerationConfig;
use crate::error::{Failure, GenerationError};
use crate::media::MediaPayload;
use crate::prompts::{random_video_preset, video_prompt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoState {
    Idle,
    Starting,
    /// `checks` status queries made so far
    Processing { checks: u32 },
    Completed { video: MediaPayload },
    Failed { error: Failure },
}

impl VideoState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Processing { .. } => "processing",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    fn failed(err: GenerationError) -> Self {
        Self::Failed {
            error: err.to_failure(),
        }
    }
}

/// Shortest gap allowed between two status checks
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Fixed-interval polling with a ceiling on status checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    /// At least one check, never back to back.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(config.poll_interval(), config.max_poll_attempts)
    }

    /// Longest a job can stay in `processing`
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Animates a memory photo into a short clip
#[derive(Clone)]
pub struct VideoGenerator {
    service: Arc<dyn GenerativeService>,
    policy: PollPolicy,
    duration_secs: u32,
    aspect_ratio: String,
}

impl VideoGenerator {
    pub fn new(service: Arc<dyn GenerativeService>, config: &GenerationConfig) -> Self {
        Self {
            service,
            policy: PollPolicy::from_config(config),
            duration_secs: config.video_duration_secs,
            aspect_ratio: config.video_aspect_ratio.clone(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Request for a memory photo: the given animation style, or a random one.
    pub fn memory_request(
        &self,
        description: &str,
        image: MediaPayload,
        preset: Option<&str>,
    ) -> VideoRequest {
        let preset = preset
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| random_video_preset());
        VideoRequest {
            prompt: video_prompt(preset, description),
            image,
            duration_secs: self.duration_secs,
            aspect_ratio: self.aspect_ratio.clone(),
        }
    }

    /// Submit the job and start polling. Must be called inside a tokio runtime.
    pub fn start(&self, request: VideoRequest) -> VideoTask {
        let (tx, rx) = watch::channel(VideoState::Starting);
        let tx = Arc::new(tx);
        let worker = tokio::spawn(run(
            self.service.clone(),
            request,
            self.policy,
            tx.clone(),
        ));
        let abort = worker.abort_handle();
        tokio::spawn(watch_worker(worker, tx.clone()));
        VideoTask {
            state: rx,
            tx,
            abort,
        }
    }
}

/// Handle to one running video job
pub struct VideoTask {
    state: watch::Receiver<VideoState>,
    tx: Arc<watch::Sender<VideoState>>,
    abort: AbortHandle,
}

impl VideoTask {
    pub fn state(&self) -> VideoState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VideoState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().is_terminal()
    }

    /// Resolves with the terminal state.
    pub async fn wait(&self) -> VideoState {
        let mut rx = self.state.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    /// Stop polling. A job that already finished keeps its result.
    pub fn cancel(&self) {
        self.abort.abort();
        publish(&self.tx, VideoState::failed(GenerationError::Cancelled));
    }
}

impl Drop for VideoTask {
    fn drop(&mut self) {
        if !self.is_finished() {
            log::debug!("Video task dropped before finishing; aborting poll");
        }
        self.cancel();
    }
}

/// Publish a new state unless the job already reached a terminal one.
fn publish(tx: &watch::Sender<VideoState>, next: VideoState) -> bool {
    tx.send_if_modified(|state| {
        if state.is_terminal() {
            false
        } else {
            *state = next;
            true
        }
    })
}

/// A poll task that panics still ends the job.
async fn watch_worker(worker: JoinHandle<()>, tx: Arc<watch::Sender<VideoState>>) {
    if let Err(err) = worker.await {
        if err.is_panic() {
            log::error!("Video polling task panicked");
            publish(
                &tx,
                VideoState::failed(GenerationError::Upstream(
                    "video polling stopped unexpectedly".to_string(),
                )),
            );
        }
    }
}

async fn run(
    service: Arc<dyn GenerativeService>,
    request: VideoRequest,
    policy: PollPolicy,
    tx: Arc<watch::Sender<VideoState>>,
) {
    let state = poll(service.as_ref(), &request, policy, &tx).await;
    log::info!("Video job ended: {}", state.label());
    if !publish(&tx, state) {
        log::debug!("Video job already finished; result dropped");
    }
}

async fn poll(
    service: &dyn GenerativeService,
    request: &VideoRequest,
    policy: PollPolicy,
    tx: &watch::Sender<VideoState>,
) -> VideoState {
    if request.prompt.trim().is_empty() {
        return VideoState::failed(GenerationError::Validation(
            "Video ke liye prompt zaroori hai.".to_string(),
        ));
    }
    if let Err(err) = service.ensure_configured() {
        return VideoState::failed(err);
    }

    let handle = match service.start_video(request).await {
        Ok(handle) => handle,
        Err(err) => return VideoState::failed(err),
    };
    log::info!("Video operation started: {}", handle);
    publish(tx, VideoState::Processing { checks: 0 });

    let mut checks = 0;
    loop {
        if checks >= policy.max_attempts {
            log::warn!("Giving up on {} after {} checks", handle, checks);
            return VideoState::failed(GenerationError::Timeout { attempts: checks });
        }
        tokio::time::sleep(policy.interval).await;
        checks += 1;

        match service.check_operation(&handle).await {
            Ok(OperationStatus::Pending) => {
                log::debug!("{} still running (check {})", handle, checks);
                publish(tx, VideoState::Processing { checks });
            }
            Ok(OperationStatus::Done {
                media_uri: Some(uri),
            }) => {
                return match service.download_media(&uri).await {
                    Ok(video) => VideoState::Completed { video },
                    Err(err) => VideoState::failed(err),
                };
            }
            Ok(OperationStatus::Done { media_uri: None }) => {
                return VideoState::failed(GenerationError::MissingPayload("video".to_string()));
            }
            Err(err) => return VideoState::failed(err),
        }
    }
}
