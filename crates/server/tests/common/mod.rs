//! Common test utilities for E2E testing with mocks.
//!
//! Builds the real router over mock upstreams and an instrumented artifact
//! store, so requests run in-process without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use leadgen_core::testing::{MockArtifactStore, MockLlmClient, MockSearchClient};
use leadgen_core::{
    BearerTokenAuthenticator, Config, ExpiryReaper, GeneratorConfig, JobStore, LeadGenerator,
};
use leadgen_server::state::AppState;

/// Re-export fixtures for test convenience
pub use leadgen_core::testing::fixtures;

pub const TOKEN: &str = "e2e-test-token";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_validate() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.post("/api/v1/tools/validate", json!({})).await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    pub router: Router,
    pub llm: Arc<MockLlmClient>,
    pub search: Arc<MockSearchClient>,
    pub artifacts: Arc<MockArtifactStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, or `Null` when the body is not JSON.
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a fixture after adjusting the default test config.
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let mut config = fixtures::config(TOKEN);
        config.server.base_url = "https://leads.example.com".to_string();
        adjust(&mut config);

        let llm = Arc::new(MockLlmClient::new());
        let search = Arc::new(MockSearchClient::new());
        let artifacts = Arc::new(MockArtifactStore::new());

        let generator = Arc::new(LeadGenerator::new(
            llm.clone(),
            search.clone(),
            artifacts.clone(),
            Arc::new(JobStore::new()),
            GeneratorConfig::from_config(&config),
        ));

        // Registered but not started; tests drive expiry directly.
        let reaper = Arc::new(ExpiryReaper::new(
            artifacts.clone(),
            config.artifacts.reap_interval(),
        ));

        let state = Arc::new(
            AppState::new(
                config,
                Arc::new(BearerTokenAuthenticator::new(TOKEN.to_string())),
                artifacts.clone(),
                generator,
            )
            .with_reaper(reaper),
        );

        Self {
            router: leadgen_server::api::create_router(state),
            llm,
            search,
            artifacts,
        }
    }

    /// Authenticated GET.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, Some(TOKEN)).await
    }

    /// Authenticated POST with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), Some(TOKEN)).await
    }

    /// GET with an explicit token, or none at all.
    pub async fn get_with_token(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", path, None, token).await
    }

    pub async fn post_with_token(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> TestResponse {
        self.request("POST", path, Some(body), token).await
    }

    /// Poll `create` until the job leaves `processing`.
    pub async fn poll_create(&self, job_id: &str) -> TestResponse {
        for _ in 0..200 {
            let response = self
                .post(
                    "/api/v1/tools/create",
                    serde_json::json!({ "job_id": job_id }),
                )
                .await;
            if response.body["status"] != "processing" {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {job_id} did not finish");
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request_builder = request_builder.header("Authorization", format!("Bearer {token}"));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
