use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{download, handlers, tools};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Everything here requires a bearer token; the auth layer runs before the handlers.
    let protected = Router::new()
        .route("/api/v1/config", get(handlers::get_config))
        .route("/api/v1/tools/validate", post(tools::validate))
        .route("/api/v1/tools/discuss", post(tools::discuss))
        .route("/api/v1/tools/build", post(tools::build))
        .route("/api/v1/tools/create", post(tools::create))
        .route("/api/v1/jobs/{id}", get(tools::get_job))
        .route("/download/{artifact_id}", get(download::download))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(protected)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
