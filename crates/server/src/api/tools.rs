//! Tool-style JSON endpoints: validate, discuss, build, create and job lookup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use leadgen_core::{
    ArtifactError, BuildStatus, CreateOutcome, DiscussOutcome, GeneratorError, JobSummary,
    LeadRequirement,
};

use super::middleware::AuthUser;
use crate::state::AppState;

const SERVICE_NAME: &str = "leadgen";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub owner_number: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscussBody {
    pub user_request: String,
}

/// `requirements` is either an object or a JSON document encoded as a string.
#[derive(Debug, Deserialize)]
pub struct BuildBody {
    pub requirements: Value,
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by the tool handlers.
#[derive(Debug)]
pub struct ToolError {
    status: StatusCode,
    message: String,
}

impl ToolError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<GeneratorError> for ToolError {
    fn from(e: GeneratorError) -> Self {
        let status = match &e {
            GeneratorError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            GeneratorError::JobNotFound(_) => StatusCode::NOT_FOUND,
            GeneratorError::LanguageModel(_) | GeneratorError::Search(_) => {
                warn!(error = %e, "Upstream failure");
                StatusCode::BAD_GATEWAY
            }
            GeneratorError::Artifact(ArtifactError::Expired { .. }) => StatusCode::GONE,
            GeneratorError::Artifact(ArtifactError::NotFound(_)) => StatusCode::NOT_FOUND,
            GeneratorError::Artifact(ArtifactError::Storage(detail)) => {
                error!(error = %detail, "Artifact storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: e.public_message(),
        }
    }
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness and identity check.
pub async fn validate(State(state): State<Arc<AppState>>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        owner_number: state.config().identity.owner_number.clone(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn discuss(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<DiscussBody>,
) -> Result<Json<DiscussOutcome>, ToolError> {
    info!(user = %user, "discuss");
    let outcome = state.generator().discuss(&body.user_request).await?;
    Ok(Json(outcome))
}

pub async fn build(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<BuildBody>,
) -> Result<Json<BuildStatus>, ToolError> {
    let requirements = parse_requirements(body.requirements).map_err(|e| {
        warn!(user = %user, error = %e, "Rejected build request");
        ToolError::bad_request(e)
    })?;

    let status = state.generator().build(requirements).await?;
    info!(user = %user, job_id = %status.job_id, "build");
    Ok(Json(status))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBody>,
) -> Result<Json<CreateOutcome>, ToolError> {
    let outcome = state.generator().create(&body.job_id).await?;
    Ok(Json(outcome))
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobSummary>, ToolError> {
    state
        .generator()
        .job(&id)
        .await
        .map(Json)
        .ok_or_else(|| GeneratorError::JobNotFound(id).into())
}

fn parse_requirements(value: Value) -> Result<LeadRequirement, String> {
    let value = match value {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| format!("requirements is not valid JSON: {}", e))?,
        other => other,
    };
    serde_json::from_value(value).map_err(|e| format!("invalid requirements: {}", e))
}
