//! The lead generation pipeline.
//!
//! `build` registers a job and returns immediately; the pipeline runs in a
//! background task and stores exactly one CSV artifact when it succeeds.
//! `create` only reads job state and the stored artifact, so callers can poll
//! it freely.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::store::JobStore;
use super::types::{
    BuildStatus, CreateOutcome, DiscussOutcome, GeneratorError, Job, JobStatus, JobSummary,
};
use crate::artifact::{ArtifactError, ArtifactStore};
use crate::config::{Config, RetryConfig};
use crate::leads::{
    extract_leads, leads_to_csv, merge_leads, parse_queries, queries_prompt, requirements_prompt,
    LeadRequirement, RequirementsDraft, CSV_FIELDS, REQUIREMENTS_SYSTEM_PROMPT,
};
use crate::llm::{parse_json_response, CompletionRequest, LlmClient};
use crate::metrics;
use crate::retry::retry_transient;
use crate::search::{OrganicResult, PlaceResult, SearchClient, SearchError, SearchRequest};

const PLACES_PER_JOB: u32 = 20;
const ESTIMATED_MINUTES: i64 = 3;

/// Settings for [`LeadGenerator`], usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub artifact_ttl_secs: u64,
    /// Base URL for download links.
    pub base_url: String,
    pub max_concurrency: usize,
    pub max_queries: usize,
    pub results_per_query: u32,
    pub default_max_results: usize,
    pub llm_max_tokens: u32,
    pub retry: RetryConfig,
}

impl GeneratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            artifact_ttl_secs: config.artifacts.ttl_secs,
            base_url: config.server.base_url.clone(),
            max_concurrency: config.pipeline.max_concurrency,
            max_queries: config.pipeline.max_queries,
            results_per_query: config.pipeline.results_per_query,
            default_max_results: config.pipeline.default_max_results,
            llm_max_tokens: config.llm.max_tokens,
            retry: config.pipeline.retry.clone(),
        }
    }

    fn download_url(&self, artifact_id: &str) -> String {
        format!(
            "{}/download/{}",
            self.base_url.trim_end_matches('/'),
            artifact_id
        )
    }
}

/// Runs discuss, build and create against the language model, the search API
/// and the artifact store.
pub struct LeadGenerator {
    llm: Arc<dyn LlmClient>,
    search: Arc<dyn SearchClient>,
    artifacts: Arc<dyn ArtifactStore>,
    jobs: Arc<JobStore>,
    config: GeneratorConfig,
    /// Bounds simultaneous outbound search calls across all jobs.
    search_permits: Semaphore,
}

impl LeadGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchClient>,
        artifacts: Arc<dyn ArtifactStore>,
        jobs: Arc<JobStore>,
        config: GeneratorConfig,
    ) -> Self {
        let permits = config.max_concurrency.max(1);
        Self {
            llm,
            search,
            artifacts,
            jobs,
            config,
            search_permits: Semaphore::new(permits),
        }
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    /// Extract structured requirements from a free-text request.
    pub async fn discuss(&self, user_request: &str) -> Result<DiscussOutcome, GeneratorError> {
        if user_request.trim().is_empty() {
            return Err(GeneratorError::InvalidParams(
                "user_request must not be empty".to_string(),
            ));
        }

        let request = CompletionRequest::new(requirements_prompt(user_request))
            .with_system(REQUIREMENTS_SYSTEM_PROMPT)
            .with_max_tokens(self.config.llm_max_tokens);
        let llm = self.llm.as_ref();
        let response = retry_transient(&self.config.retry, "discuss", || {
            llm.complete(request.clone())
        })
        .await
        .map_err(|e| GeneratorError::LanguageModel(e.to_string()))?;

        let draft: RequirementsDraft = parse_json_response(&response.text)
            .map_err(|e| GeneratorError::LanguageModel(e.to_string()))?;

        let outcome = match draft.to_requirement(self.config.default_max_results) {
            Some(requirements) if draft.clarifying_questions.is_empty() => {
                DiscussOutcome::RequirementsReady {
                    message: format!(
                        "Ready to find up to {} {} leads in {}. Call build with these requirements.",
                        requirements.max_results, requirements.industry, requirements.location
                    ),
                    requirements,
                }
            }
            _ => {
                let mut questions = draft.clarifying_questions.clone();
                if questions.is_empty() {
                    questions = missing_field_questions(&draft);
                }
                DiscussOutcome::NeedsClarification {
                    extracted_requirements: draft,
                    questions,
                    message: "A few details are needed before searching.".to_string(),
                }
            }
        };

        Ok(outcome)
    }

    /// Register a job and start the pipeline in the background.
    pub async fn build(
        self: &Arc<Self>,
        requirements: LeadRequirement,
    ) -> Result<BuildStatus, GeneratorError> {
        requirements
            .validate()
            .map_err(GeneratorError::InvalidParams)?;

        let job = Job::new(requirements.clone());
        let job_id = job.id.clone();
        let created_at = job.created_at;
        self.jobs.insert(job).await;

        info!(
            job_id = %job_id,
            industry = %requirements.industry,
            location = %requirements.location,
            max_results = requirements.max_results,
            "Lead generation job started"
        );

        let generator = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move {
            generator.run_job(&id, &requirements).await;
        });

        Ok(BuildStatus {
            job_id,
            status: JobStatus::Processing,
            progress: 0,
            estimated_completion: created_at + chrono::Duration::minutes(ESTIMATED_MINUTES),
            results_count: 0,
            message: "Lead generation started. This usually takes 2-5 minutes; \
                      poll create with the job_id."
                .to_string(),
        })
    }

    /// Report job state; for completed jobs return the stored CSV and its link.
    pub async fn create(&self, job_id: &str) -> Result<CreateOutcome, GeneratorError> {
        let job = self
            .jobs
            .get(job_id)
            .await
            .ok_or_else(|| GeneratorError::JobNotFound(job_id.to_string()))?;

        match job.status {
            JobStatus::Processing => Ok(CreateOutcome::Processing {
                message: format!("Lead generation in progress ({}%).", job.progress),
                job_id: job.id,
                progress: job.progress,
            }),
            JobStatus::Failed => {
                let error = job.error.unwrap_or_else(|| "unknown error".to_string());
                Ok(CreateOutcome::Failed {
                    message: format!("Lead generation failed: {}", error),
                    job_id: job.id,
                    error,
                })
            }
            JobStatus::Completed => {
                let info = job.artifact.ok_or_else(|| {
                    ArtifactError::Storage(format!("job {} has no artifact", job.id))
                })?;
                let artifact = self.artifacts.get(&info.id).await?;
                let total_leads = job.leads.len();

                Ok(CreateOutcome::Completed {
                    job_id: job.id,
                    total_leads,
                    fields: CSV_FIELDS.iter().map(|f| f.to_string()).collect(),
                    artifact_id: info.id.to_string(),
                    download_url: self.config.download_url(info.id.as_str()),
                    expires_at: info.expires_at,
                    filename: info.filename.clone(),
                    csv_content: String::from_utf8_lossy(&artifact.payload).into_owned(),
                    message: format!(
                        "Generated {} leads. The download link expires at {}.",
                        total_leads,
                        info.expires_at.to_rfc3339()
                    ),
                })
            }
        }
    }

    pub async fn job(&self, job_id: &str) -> Option<JobSummary> {
        self.jobs.get(job_id).await.map(|job| job.summary())
    }

    async fn run_job(&self, job_id: &str, requirements: &LeadRequirement) {
        let started = Instant::now();
        let result = self.execute(job_id, requirements).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(count) => {
                info!(job_id = %job_id, leads = count, elapsed_secs = elapsed, "Lead generation job completed");
                metrics::JOBS_TOTAL.with_label_values(&["completed"]).inc();
                metrics::JOB_DURATION
                    .with_label_values(&["completed"])
                    .observe(elapsed);
                metrics::LEADS_PER_JOB
                    .with_label_values(&[])
                    .observe(count as f64);
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Lead generation job failed");
                self.jobs.fail(job_id, e.public_message()).await;
                metrics::JOBS_TOTAL.with_label_values(&["failed"]).inc();
                metrics::JOB_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed);
            }
        }
    }

    async fn execute(
        &self,
        job_id: &str,
        requirements: &LeadRequirement,
    ) -> Result<usize, GeneratorError> {
        self.jobs.set_progress(job_id, 10).await;
        let queries = self.generate_queries(requirements).await?;
        self.jobs.set_progress(job_id, 20).await;
        debug!(job_id = %job_id, queries = ?queries, "Generated search queries");

        let total_searches = queries.len() + 1;
        let finished = &AtomicUsize::new(0);
        let jobs = self.jobs.as_ref();
        let report_progress = move || async move {
            let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
            let progress = 20 + (70 * done / total_searches) as u8;
            jobs.set_progress(job_id, progress).await;
        };

        let places_request = SearchRequest::new(
            format!("{} {}", requirements.industry, requirements.location),
            PLACES_PER_JOB,
        )
        .with_location(requirements.location.clone());
        let places_search = async {
            let result = self.limited_places(&places_request).await;
            report_progress().await;
            result
        };

        let organic_searches = queries.iter().map(|query| {
            let request = SearchRequest::new(
                format!("{} {}", query, requirements.location),
                self.config.results_per_query,
            )
            .with_location(requirements.location.clone());
            async move {
                let result = self.limited_search(&request).await;
                report_progress().await;
                result
            }
        });

        let (places_result, organic_results) =
            tokio::join!(places_search, join_all(organic_searches));

        let mut failures = 0;
        let mut last_error = None;
        let places = match places_result {
            Ok(places) => places,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Places search failed");
                failures += 1;
                last_error = Some(e);
                Vec::new()
            }
        };
        let mut organic: Vec<OrganicResult> = Vec::new();
        for result in organic_results {
            match result {
                Ok(mut results) => organic.append(&mut results),
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "Web search failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }
        if failures == total_searches {
            let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(GeneratorError::Search(format!(
                "all {} searches failed: {}",
                total_searches, reason
            )));
        }

        let leads = merge_leads(extract_leads(&organic, &places), requirements.max_results);
        self.jobs.set_progress(job_id, 90).await;

        let info = self
            .artifacts
            .put(leads_to_csv(&leads), self.config.artifact_ttl_secs)
            .await?;
        let count = leads.len();
        debug!(job_id = %job_id, artifact_id = %info.id, "Stored lead CSV");
        self.jobs.complete(job_id, leads, info).await;

        Ok(count)
    }

    async fn generate_queries(
        &self,
        requirements: &LeadRequirement,
    ) -> Result<Vec<String>, GeneratorError> {
        let request = CompletionRequest::new(queries_prompt(requirements))
            .with_max_tokens(self.config.llm_max_tokens)
            .with_temperature(0.3);
        let llm = self.llm.as_ref();
        let response = retry_transient(&self.config.retry, "generate_queries", || {
            llm.complete(request.clone())
        })
        .await
        .map_err(|e| GeneratorError::LanguageModel(e.to_string()))?;

        let mut queries = parse_queries(&response.text, self.config.max_queries);
        if queries.is_empty() {
            queries.push(format!("{} {}", requirements.industry, requirements.location));
        }
        Ok(queries)
    }

    async fn limited_search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<OrganicResult>, SearchError> {
        let search = self.search.as_ref();
        let permits = &self.search_permits;
        retry_transient(&self.config.retry, "search", || async move {
            let _permit = permits
                .acquire()
                .await
                .map_err(|e| SearchError::ConnectionFailed(e.to_string()))?;
            search.search(request).await
        })
        .await
    }

    async fn limited_places(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<PlaceResult>, SearchError> {
        let search = self.search.as_ref();
        let permits = &self.search_permits;
        retry_transient(&self.config.retry, "places", || async move {
            let _permit = permits
                .acquire()
                .await
                .map_err(|e| SearchError::ConnectionFailed(e.to_string()))?;
            search.places(request).await
        })
        .await
    }
}

fn missing_field_questions(draft: &RequirementsDraft) -> Vec<String> {
    let mut questions = Vec::new();
    if draft.industry.as_deref().is_none_or(|v| v.trim().is_empty()) {
        questions.push("What type of business or industry are you looking for?".to_string());
    }
    if draft.location.as_deref().is_none_or(|v| v.trim().is_empty()) {
        questions.push("Which city or region should the search cover?".to_string());
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url() {
        let config = GeneratorConfig {
            artifact_ttl_secs: 60,
            base_url: "https://leads.example.com/".to_string(),
            max_concurrency: 1,
            max_queries: 5,
            results_per_query: 20,
            default_max_results: 50,
            llm_max_tokens: 512,
            retry: RetryConfig::default(),
        };
        assert_eq!(
            config.download_url("abc"),
            "https://leads.example.com/download/abc"
        );
    }

    #[test]
    fn test_missing_field_questions() {
        let draft = RequirementsDraft {
            industry: Some("plumbers".to_string()),
            ..Default::default()
        };
        let questions = missing_field_questions(&draft);
        assert_eq!(questions.len(), 1);
        assert!(questions[0].contains("city"));
    }
}
