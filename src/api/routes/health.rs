//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::HealthResponse};

/// GET /api/v1/health
///
/// Reports whether the record store answers
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    let health = state.records.health().await?;

    Ok(Json(HealthResponse {
        status: if health.healthy { "ok" } else { "degraded" }.to_string(),
        message: health.message,
        timestamp: chrono::Utc::now().to_rfc3339(),
        metadata: health.metadata,
    }))
}
