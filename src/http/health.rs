//! Liveness endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::events::EventBus;
use crate::http::response::ApiResponse;

#[derive(Clone)]
pub struct HealthState {
    pub started_at: Instant,
    pub events: Arc<EventBus>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Seconds since the service was composed.
    pub uptime: f64,
    pub message: &'static str,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
    pub events: EventCounters,
}

#[derive(Debug, Serialize)]
pub struct EventCounters {
    pub delivered: u64,
    pub failed: u64,
}

/// `GET /health`
pub async fn health_check(State(state): State<HealthState>) -> Json<ApiResponse<HealthReport>> {
    let diagnostics = state.events.diagnostics();
    let report = HealthReport {
        uptime: state.started_at.elapsed().as_secs_f64(),
        message: "OK",
        timestamp: Utc::now().timestamp_millis(),
        events: EventCounters {
            delivered: diagnostics.delivered(),
            failed: diagnostics.failed(),
        },
    };
    Json(ApiResponse::success("Service is healthy", report))
}
