use axum::{Json, extract::State};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceStatus,
}

#[derive(Serialize)]
pub struct ServiceStatus {
    pub database: bool,
    pub llm_configured: bool,
    pub ocr_configured: bool,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
}

/// Lightweight liveness probe for Docker healthchecks.
/// Returns 200 immediately - no DB or provider calls.
/// Use `/health` for the full diagnostic check.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { status: "ok" })
}

/// Full health check - queries the database and reports which optional
/// providers are configured. Provider absence is degradation, not
/// unhealthiness: the scan pipeline still works in fallback mode.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .is_ok();

    let status = if database { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceStatus {
            database,
            llm_configured: state.scans.llm_configured(),
            ocr_configured: state.scans.ocr_configured(),
        },
    })
}
