//! Liveness and readiness probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::warn;

use super::state::AppState;
use super::types::ApiResponse;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessStatus {
    pub status: &'static str,
    pub storage: &'static str,
    pub latency_ms: u64,
}

pub async fn health_check() -> impl IntoResponse {
    ApiResponse::ok(HealthStatus {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Pings the database when one is configured
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let (storage, ready) = match &state.db {
        None => ("memory", true),
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => ("postgres", true),
            Err(e) => {
                warn!(error = %e, "Readiness check failed");
                ("postgres", false)
            }
        },
    };

    let body = ApiResponse {
        ok: ready,
        data: Some(ReadinessStatus {
            status: if ready { "ready" } else { "unavailable" },
            storage,
            latency_ms: start.elapsed().as_millis() as u64,
        }),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, body)
}
