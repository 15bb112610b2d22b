//! services/api/src/web/health.rs
//!
//! Liveness, service information, and the catch-all 404.

use crate::error::ApiError;
use crate::web::state::AppState;
use axum::{
    extract::{OriginalUri, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::response::ApiResponse;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started.
    pub uptime: f64,
    pub environment: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: BTreeMap<String, String>,
}

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthStatus)
    )
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = HealthStatus {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
        environment: state.config.environment.clone(),
    };
    ApiResponse::ok(status).with_message("Server is healthy")
}

/// GET / - Service information and endpoint map
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    )
)]
pub async fn root_handler() -> impl IntoResponse {
    let endpoints = [
        ("health", "/health"),
        ("auth", "/api/auth"),
        ("courses", "/api/courses"),
        ("user", "/api/user"),
        ("docs", "/swagger-ui"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    ApiResponse::ok(ServiceInfo {
        name: "Student Learning Dashboard API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Backend for the student learning dashboard".to_string(),
        endpoints,
    })
}

/// Any route that matched nothing, including a known path called with the
/// wrong method. The message carries the full request target.
pub async fn fallback_handler(OriginalUri(uri): OriginalUri) -> ApiError {
    let target = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    ApiError::NotFound(format!("Route {} not found", target))
}
