//! End-to-end tests driving the router in-process with mock upstreams.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture, TOKEN};

async fn seed_pipeline(fixture: &TestFixture) {
    fixture
        .llm
        .respond_when("web search queries", "dentists Toronto phone")
        .await;
    fixture
        .search
        .set_organic(vec![fixtures::organic("Maple Dental, Inc.", "416-555-0101")])
        .await;
    fixture
        .search
        .set_places(vec![fixtures::place("Harbour Dentistry", "416.555.0199")])
        .await;
}

async fn start_job(fixture: &TestFixture) -> String {
    let response = fixture
        .post(
            "/api/v1/tools/build",
            json!({ "requirements": { "industry": "dentists", "location": "Toronto" } }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", "processing");
    assert_json_path!(response.body, "progress", 0);
    response.body["job_id"].as_str().unwrap().to_string()
}

// =============================================================================
// Public endpoints and authentication
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let fixture = TestFixture::new().await;
    let response = fixture.get_with_token("/api/v1/health", None).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", "ok");
    assert_json_path!(response.body["reaper"], "running", false);
    assert!(response.body["reaper"]["interval_ms"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_metrics_is_public() {
    let fixture = TestFixture::new().await;
    let response = fixture.get_with_token("/metrics", None).await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("leadgen_http_requests_total"));
}

#[tokio::test]
async fn test_tools_require_token() {
    let fixture = TestFixture::new().await;

    let missing = fixture
        .post_with_token("/api/v1/tools/validate", json!({}), None)
        .await;
    assert_status!(missing, StatusCode::UNAUTHORIZED);

    let wrong = fixture
        .post_with_token("/api/v1/tools/validate", json!({}), Some("nope"))
        .await;
    assert_status!(wrong, StatusCode::UNAUTHORIZED);
    assert_json_path!(wrong.body, "error", "invalid credential");
}

#[tokio::test]
async fn test_rejected_build_has_no_side_effects() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post_with_token(
            "/api/v1/tools/build",
            json!({ "requirements": { "industry": "dentists", "location": "Toronto" } }),
            Some("nope"),
        )
        .await;
    assert_status!(response, StatusCode::UNAUTHORIZED);
    assert_eq!(fixture.llm.call_count().await, 0);
    assert!(fixture.search.recorded_searches().await.is_empty());
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body["auth"], "token_configured", true);
    assert!(!response.text.contains(TOKEN));
    assert!(!response.text.contains("test-serper-key"));
    assert!(!response.text.contains("test-gemini-key"));
}

// =============================================================================
// Tools
// =============================================================================

#[tokio::test]
async fn test_validate_reports_identity() {
    let fixture = TestFixture::new().await;
    let response = fixture.post("/api/v1/tools/validate", json!({})).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "owner_number", "15550001111");
    assert_json_path!(response.body, "service", "leadgen");
}

#[tokio::test]
async fn test_discuss_requirements_ready() {
    let fixture = TestFixture::new().await;
    fixture
        .llm
        .respond_when(
            "Lead generation request",
            &fixtures::requirements_reply("dentists", "Toronto"),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/tools/discuss",
            json!({ "user_request": "25 dentists in Toronto please" }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", "requirements_ready");
    assert_json_path!(response.body["requirements"], "industry", "dentists");
    assert_json_path!(response.body["requirements"], "max_results", 25);
}

#[tokio::test]
async fn test_discuss_needs_clarification() {
    let fixture = TestFixture::new().await;
    fixture
        .llm
        .respond_when(
            "Lead generation request",
            r#"{"industry": "dentists", "clarifying_questions": ["Which city?"]}"#,
        )
        .await;

    let response = fixture
        .post("/api/v1/tools/discuss", json!({ "user_request": "dentists" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", "needs_clarification");
    assert_json_path!(response.body["questions"], 0, "Which city?");
}

#[tokio::test]
async fn test_discuss_upstream_failure_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    fixture.llm.set_default_reply("I cannot help with that").await;

    let response = fixture
        .post("/api/v1/tools/discuss", json!({ "user_request": "dentists" }))
        .await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_json_path!(
        response.body,
        "error",
        "language model unavailable, try again later"
    );
    assert!(!response.text.contains("I cannot help"));
}

#[tokio::test]
async fn test_build_rejects_invalid_requirements() {
    let fixture = TestFixture::new().await;

    for requirements in [
        json!({ "industry": "dentists" }),
        json!({ "industry": "", "location": "Toronto" }),
        json!({ "industry": "dentists", "location": "Toronto", "max_results": 0 }),
        json!("not json at all"),
    ] {
        let response = fixture
            .post("/api/v1/tools/build", json!({ "requirements": requirements }))
            .await;
        assert_status!(response, StatusCode::BAD_REQUEST);
        assert!(response.body["error"].is_string());
    }
    assert_eq!(fixture.search.recorded_searches().await.len(), 0);
}

#[tokio::test]
async fn test_build_accepts_requirements_as_string() {
    let fixture = TestFixture::new().await;
    seed_pipeline(&fixture).await;

    let response = fixture
        .post(
            "/api/v1/tools/build",
            json!({ "requirements": r#"{"industry": "dentists", "location": "Toronto", "max_results": 5}"# }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "results_count", 0);
}

#[tokio::test]
async fn test_create_unknown_job() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/tools/create", json!({ "job_id": "missing" }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_build_create_download_flow() {
    let fixture = TestFixture::new().await;
    seed_pipeline(&fixture).await;

    let job_id = start_job(&fixture).await;
    let created = fixture.poll_create(&job_id).await;

    assert_status!(created, StatusCode::OK);
    assert_json_path!(created.body, "status", "completed");
    assert_json_path!(created.body, "total_leads", 2);

    let artifact_id = created.body["artifact_id"].as_str().unwrap().to_string();
    let download_url = created.body["download_url"].as_str().unwrap();
    assert_eq!(
        download_url,
        format!("https://leads.example.com/download/{artifact_id}")
    );
    assert_eq!(
        created.body["filename"],
        format!("leads_{artifact_id}.csv").as_str()
    );

    // Polling again returns the same artifact without storing another one.
    let again = fixture.poll_create(&job_id).await;
    assert_json_path!(again.body, "artifact_id", artifact_id.as_str());
    assert_eq!(fixture.artifacts.put_calls(), 1);

    let downloaded = fixture.get(&format!("/download/{artifact_id}")).await;
    assert_status!(downloaded, StatusCode::OK);
    assert_eq!(
        downloaded.headers["content-type"],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        downloaded.headers["content-disposition"],
        format!("attachment; filename=\"leads_{artifact_id}.csv\"").as_str()
    );
    assert_eq!(downloaded.headers["cache-control"], "no-store");
    assert!(downloaded.headers.contains_key("etag"));
    assert!(downloaded.headers.contains_key("expires"));
    assert_eq!(downloaded.text, created.body["csv_content"].as_str().unwrap());
    assert!(downloaded.text.contains("\"Maple Dental, Inc.\""));

    // Downloads are multi-use within the TTL.
    let second = fixture.get(&format!("/download/{artifact_id}")).await;
    assert_status!(second, StatusCode::OK);
    assert_eq!(second.text, downloaded.text);

    let job = fixture.get(&format!("/api/v1/jobs/{job_id}")).await;
    assert_status!(job, StatusCode::OK);
    assert_json_path!(job.body, "status", "completed");
    assert_json_path!(job.body, "results_count", 2);
    assert_json_path!(job.body["artifact"], "id", artifact_id.as_str());
}

#[tokio::test]
async fn test_failed_job_reports_error() {
    let fixture = TestFixture::new().await;
    seed_pipeline(&fixture).await;
    fixture.search.fail_permanently(true);

    let job_id = start_job(&fixture).await;
    let created = fixture.poll_create(&job_id).await;

    assert_status!(created, StatusCode::OK);
    assert_json_path!(created.body, "status", "failed");
    assert_json_path!(created.body, "error", "all searches failed, try again later");
    assert_json_path!(
        created.body,
        "message",
        "Lead generation failed: all searches failed, try again later"
    );
}

#[tokio::test]
async fn test_unknown_job_lookup() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/jobs/does-not-exist").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Download gateway
// =============================================================================

#[tokio::test]
async fn test_download_unknown_and_malformed_ids() {
    let fixture = TestFixture::new().await;

    let unknown = fixture
        .get("/download/550e8400-e29b-41d4-a716-446655440000")
        .await;
    assert_status!(unknown, StatusCode::NOT_FOUND);
    assert_json_path!(unknown.body, "error", "not found");

    let malformed = fixture.get("/download/..%2F..%2Fetc%2Fpasswd").await;
    assert_status!(malformed, StatusCode::NOT_FOUND);
    assert_json_path!(malformed.body, "error", "not found");
}

#[tokio::test]
async fn test_download_with_bad_token_never_touches_store() {
    let fixture = TestFixture::new().await;
    let path = "/download/550e8400-e29b-41d4-a716-446655440000";

    let response = fixture.get_with_token(path, Some("wrong")).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture.get_with_token(path, None).await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    assert_eq!(fixture.artifacts.get_calls(), 0);
}

#[tokio::test]
async fn test_expired_link_is_gone() {
    let fixture = TestFixture::with_config(|config| config.artifacts.ttl_secs = 0).await;
    seed_pipeline(&fixture).await;

    let job_id = start_job(&fixture).await;
    let job = loop {
        let job = fixture.get(&format!("/api/v1/jobs/{job_id}")).await;
        if job.body["status"] != "processing" {
            break job;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    };
    assert_json_path!(job.body, "status", "completed");
    let artifact_id = job.body["artifact"]["id"].as_str().unwrap().to_string();

    let created = fixture
        .post("/api/v1/tools/create", json!({ "job_id": job_id }))
        .await;
    assert_status!(created, StatusCode::GONE);
    assert_json_path!(created.body, "error", "link expired");

    let downloaded = fixture.get(&format!("/download/{artifact_id}")).await;
    assert_status!(downloaded, StatusCode::GONE);
    assert_json_path!(downloaded.body, "error", "link expired");
}
