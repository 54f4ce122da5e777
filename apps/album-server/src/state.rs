use album::{AlbumStore, MemoryId, RecordStore};
use chrono::{DateTime, Duration, Utc};
use generation::{Generators, VideoState, VideoTask};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

pub type SharedStore = Box<dyn RecordStore>;

/// A running or finished video job. Dropping it stops the polling.
pub struct VideoJob {
    pub memory_id: MemoryId,
    pub task: VideoTask,
    pub started_at: DateTime<Utc>,
}

pub struct AppState {
    /// Mutations are serialized through this lock
    pub album: Mutex<AlbumStore<SharedStore>>,
    pub generators: Generators,
    jobs: RwLock<HashMap<String, VideoJob>>,
}

/// Finished jobs are kept this long for status reads
const FINISHED_JOB_TTL_MINUTES: i64 = 60;

impl AppState {
    pub fn new(album: AlbumStore<SharedStore>, generators: Generators) -> Self {
        Self {
            album: Mutex::new(album),
            generators,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_job(&self, job_id: String, job: VideoJob) {
        let mut jobs = self.jobs.write();
        let cutoff = Utc::now() - Duration::minutes(FINISHED_JOB_TTL_MINUTES);
        jobs.retain(|_, j| !(j.task.is_finished() && j.started_at < cutoff));
        jobs.insert(job_id, job);
    }

    pub fn job_state(&self, job_id: &str) -> Option<(MemoryId, VideoState)> {
        self.jobs
            .read()
            .get(job_id)
            .map(|job| (job.memory_id.clone(), job.task.state()))
    }

    /// Most recently started job for a memory
    pub fn latest_job_for(&self, memory_id: &MemoryId) -> Option<(String, VideoState)> {
        self.jobs
            .read()
            .iter()
            .filter(|(_, job)| &job.memory_id == memory_id)
            .max_by_key(|(_, job)| job.started_at)
            .map(|(id, job)| (id.clone(), job.task.state()))
    }

    /// Remove a job, cancelling it if still running.
    pub fn remove_job(&self, job_id: &str) -> Option<(MemoryId, VideoState)> {
        let job = self.jobs.write().remove(job_id)?;
        job.task.cancel();
        Some((job.memory_id, job.task.state()))
    }
}
