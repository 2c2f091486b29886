//! Download gateway for stored CSV artifacts.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use leadgen_core::{ArtifactError, ArtifactId};

use super::middleware::AuthUser;
use crate::metrics::DOWNLOADS_TOTAL;
use crate::state::AppState;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// `GET /download/{artifact_id}`
///
/// Serves the payload while the artifact is live. Malformed ids get the same
/// 404 as unknown ones.
pub async fn download(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = ArtifactId::parse(&raw_id) else {
        DOWNLOADS_TOTAL.with_label_values(&["not_found"]).inc();
        return not_found();
    };

    match state.artifacts().get(&id).await {
        Ok(artifact) => {
            DOWNLOADS_TOTAL.with_label_values(&["served"]).inc();
            info!(
                user = %user,
                artifact_id = %id,
                size_bytes = artifact.info.size_bytes,
                "Serving artifact"
            );
            let info = artifact.info;
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", info.filename),
                    ),
                    (header::ETAG, format!("\"{}\"", info.sha256)),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                    (header::EXPIRES, info.expires_at.format(HTTP_DATE).to_string()),
                ],
                artifact.payload,
            )
                .into_response()
        }
        Err(ArtifactError::NotFound(_)) => {
            DOWNLOADS_TOTAL.with_label_values(&["not_found"]).inc();
            not_found()
        }
        Err(ArtifactError::Expired { expired_at, .. }) => {
            DOWNLOADS_TOTAL.with_label_values(&["expired"]).inc();
            info!(user = %user, artifact_id = %id, expired_at = %expired_at, "Download link expired");
            (StatusCode::GONE, Json(json!({ "error": "link expired" }))).into_response()
        }
        Err(ArtifactError::Storage(e)) => {
            DOWNLOADS_TOTAL.with_label_values(&["error"]).inc();
            error!(artifact_id = %id, error = %e, "Failed to read artifact");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "storage failure" })),
            )
                .into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
}
