//! Types for lead generation jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::artifact::{ArtifactError, ArtifactInfo};
use crate::leads::{Lead, LeadRequirement, RequirementsDraft};

/// Errors surfaced by the lead generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Caller supplied unusable input.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Language model failed after retries or returned unusable output.
    #[error("language model failure: {0}")]
    LanguageModel(String),

    /// Every search request of a job failed.
    #[error("search failure: {0}")]
    Search(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl GeneratorError {
    /// Short message safe to show to API callers.
    ///
    /// Upstream and storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            GeneratorError::InvalidParams(_) => self.to_string(),
            GeneratorError::JobNotFound(_) => "job not found".to_string(),
            GeneratorError::LanguageModel(_) => {
                "language model unavailable, try again later".to_string()
            }
            GeneratorError::Search(_) => "all searches failed, try again later".to_string(),
            GeneratorError::Artifact(ArtifactError::Expired { .. }) => "link expired".to_string(),
            GeneratorError::Artifact(ArtifactError::NotFound(_)) => "not found".to_string(),
            GeneratorError::Artifact(ArtifactError::Storage(_)) => "storage failure".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// One `build` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// 0..=100
    pub progress: u8,
    pub requirements: LeadRequirement,
    pub leads: Vec<Lead>,
    /// Set once the CSV has been stored. At most one per job.
    pub artifact: Option<ArtifactInfo>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(requirements: LeadRequirement) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Processing,
            progress: 0,
            requirements,
            leads: Vec::new(),
            artifact: None,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Processing
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            requirements: self.requirements.clone(),
            results_count: self.leads.len(),
            artifact: self.artifact.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            error: self.error.clone(),
        }
    }
}

/// Job view returned by the jobs endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub requirements: LeadRequirement,
    pub results_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactInfo>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `discuss`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscussOutcome {
    NeedsClarification {
        extracted_requirements: RequirementsDraft,
        questions: Vec<String>,
        message: String,
    },
    RequirementsReady {
        requirements: LeadRequirement,
        message: String,
    },
}

/// Immediate reply to `build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStatus {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub estimated_completion: DateTime<Utc>,
    pub results_count: usize,
    pub message: String,
}

/// Result of `create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreateOutcome {
    Processing {
        job_id: String,
        progress: u8,
        message: String,
    },
    Failed {
        job_id: String,
        error: String,
        message: String,
    },
    Completed {
        job_id: String,
        total_leads: usize,
        fields: Vec<String>,
        artifact_id: String,
        download_url: String,
        expires_at: DateTime<Utc>,
        filename: String,
        csv_content: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_processing() {
        let job = Job::new(LeadRequirement::new("dentists", "Toronto"));
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 0);
        assert!(!job.is_finished());
        assert!(Uuid::parse_str(&job.id).is_ok());
    }

    #[test]
    fn test_discuss_outcome_tagging() {
        let outcome = DiscussOutcome::RequirementsReady {
            requirements: LeadRequirement::new("dentists", "Toronto"),
            message: "ok".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "requirements_ready");
        assert_eq!(json["requirements"]["industry"], "dentists");
    }

    #[test]
    fn test_create_outcome_tagging() {
        let outcome = CreateOutcome::Processing {
            job_id: "j".to_string(),
            progress: 40,
            message: "working".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["progress"], 40);
    }
}
