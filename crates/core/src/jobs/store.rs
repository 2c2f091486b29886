use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::types::{Job, JobStatus};
use crate::artifact::ArtifactInfo;
use crate::leads::Lead;

/// In-memory registry of jobs.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Raise progress of a processing job. Progress never goes backwards.
    pub async fn set_progress(&self, id: &str, progress: u8) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(id) {
            if job.status == JobStatus::Processing {
                job.progress = job.progress.max(progress.min(100));
            }
        }
    }

    /// Mark a job completed with its artifact. A finished job is left untouched.
    pub async fn complete(&self, id: &str, leads: Vec<Lead>, artifact: ArtifactInfo) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) if !job.is_finished() => {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.leads = leads;
                job.artifact = Some(artifact);
                job.completed_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    pub async fn fail(&self, id: &str, error: impl Into<String>) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) if !job.is_finished() => {
                job.status = JobStatus::Failed;
                job.error = Some(error.into());
                job.completed_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    /// Remove finished jobs that completed more than `retention` before `now`.
    pub async fn prune_finished(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| match job.completed_at {
            Some(done) => done
                .checked_add_signed(retention)
                .is_none_or(|until| until > now),
            None => true,
        });
        before - jobs.len()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn count_by_status(&self, status: JobStatus) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|job| job.status == status)
            .count()
    }
}
