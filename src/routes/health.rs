//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - Liveness probe (is the service running?)
//! - /ready, /readyz - Readiness probe (does the store answer a ping?)

use hyper::StatusCode;
use serde::Serialize;
use serde_json::json;

use crate::envelope::Envelope;
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Store backend name
    pub store: &'static str,
    pub mode: &'static str,
    pub auth_enabled: bool,
    /// Whether POST /api/register creates accounts
    pub registration_open: bool,
    pub uptime_seconds: i64,
    pub timestamp: String,
}

/// Liveness: always 200 while the process runs
pub fn health_check(state: &AppState) -> Envelope {
    let now = chrono::Utc::now();
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        store: state.store.backend(),
        mode: if state.args.dev_mode { "development" } else { "production" },
        auth_enabled: state.gate.is_some(),
        registration_open: state.login.registration_open(),
        uptime_seconds: (now - state.started_at).num_seconds(),
        timestamp: now.to_rfc3339(),
    };

    Envelope::ok(serde_json::to_value(response).unwrap_or_else(|_| json!({ "healthy": true })))
}

/// Readiness: 200 if the store answers a ping, 503 otherwise
pub async fn readiness_check(state: &AppState) -> Envelope {
    match state.store.ping().await {
        Ok(()) => Envelope::ok(json!({ "ready": true, "store": state.store.backend() })),
        Err(e) => Envelope::new(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "message": "Store not reachable",
                "ready": false,
                "retryable": e.is_retryable(),
            }),
        ),
    }
}
