//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Artifact lifecycle (creation, reaping, live count)
//! - Lead generation jobs
//! - External services (search API, language model)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Artifact Metrics
// =============================================================================

/// Artifacts stored total.
pub static ARTIFACTS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("leadgen_artifacts_created_total", "Total CSV artifacts stored").unwrap()
});

/// Artifacts removed by the expiry reaper.
pub static ARTIFACTS_REAPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "leadgen_artifacts_reaped_total",
        "Total expired artifacts removed by the reaper",
    )
    .unwrap()
});

/// Reaper deletions that failed and will be retried on a later tick.
pub static ARTIFACT_REAP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "leadgen_artifact_reap_failures_total",
        "Total artifact deletions that failed during reaping",
    )
    .unwrap()
});

/// Artifacts currently held by the store.
pub static ARTIFACTS_LIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("leadgen_artifacts_live", "Artifacts currently stored").unwrap()
});

/// Artifact payload sizes in bytes.
pub static ARTIFACT_SIZE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("leadgen_artifact_size_bytes", "Size of stored CSV artifacts")
            .buckets(vec![256.0, 1024.0, 4096.0, 16384.0, 65536.0, 262144.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Lead generation jobs by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("leadgen_jobs_total", "Total lead generation jobs"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("leadgen_job_duration_seconds", "Duration of lead generation jobs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

/// Leads produced per completed job.
pub static LEADS_PER_JOB: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("leadgen_leads_per_job", "Number of leads per completed job")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "leadgen_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["service", "operation"], // service: "serper", "gemini"
    )
    .unwrap()
});

/// External service requests by result.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "leadgen_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Retries of transient upstream failures.
pub static RETRY_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("leadgen_retry_attempts_total", "Total upstream retry attempts"),
        &["operation"],
    )
    .unwrap()
});

/// LLM token usage.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("leadgen_llm_tokens_total", "Total LLM tokens used"),
        &["type"], // "input", "output"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Artifacts
        Box::new(ARTIFACTS_CREATED.clone()),
        Box::new(ARTIFACTS_REAPED.clone()),
        Box::new(ARTIFACT_REAP_FAILURES.clone()),
        Box::new(ARTIFACTS_LIVE.clone()),
        Box::new(ARTIFACT_SIZE.clone()),
        // Jobs
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(LEADS_PER_JOB.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(LLM_TOKENS.clone()),
    ]
}
