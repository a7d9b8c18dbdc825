//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::repository::CommandRepository;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response with dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Dependency statuses
    pub dependencies: BTreeMap<String, DependencyStatus>,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `/health` and `/ready`, always served at the root
pub fn routes<R: CommandRepository>() -> Router<AppState<R>> {
    Router::new()
        .route("/health", get(health::<R>))
        .route("/ready", get(readiness::<R>))
}

/// Liveness probe; 200 whenever the process is serving
pub async fn health<R: CommandRepository>(State(state): State<AppState<R>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness probe
///
/// 200 when the command store answers a ping, 503 otherwise.
pub async fn readiness<R: CommandRepository>(
    State(state): State<AppState<R>>,
) -> impl IntoResponse {
    let store = match state.repository().ping().await {
        Ok(()) => DependencyStatus {
            healthy: true,
            message: Some("Connected".to_string()),
        },
        Err(e) => {
            tracing::error!(kind = %e.kind, "Command store health check failed: {}", e.message);
            DependencyStatus {
                healthy: false,
                message: Some("Unreachable".to_string()),
            }
        }
    };

    let ready = store.healthy;
    let mut dependencies = BTreeMap::new();
    dependencies.insert("command_store".to_string(), store);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            service: state.config().service.name.clone(),
            dependencies,
        }),
    )
}
