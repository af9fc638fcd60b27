//! Monitor endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{DeleteResponse, ExportQuery},
};
use crate::facade::ImportReport;
use crate::model::Monitor;

use super::csv_response;

/// GET /api/v1/monitors
pub async fn list_monitors(State(state): State<ApiState>) -> ApiResult<Json<Vec<Monitor>>> {
    Ok(Json(state.records.list_monitors().await?))
}

/// POST /api/v1/monitors
///
/// Add-only; 409 if the alert name is taken
pub async fn create_monitor(
    State(state): State<ApiState>,
    Json(monitor): Json<Monitor>,
) -> ApiResult<(StatusCode, Json<Monitor>)> {
    state.records.add_monitor(&monitor).await?;
    Ok((StatusCode::CREATED, Json(monitor)))
}

/// GET /api/v1/monitors/:name
pub async fn get_monitor(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Monitor>> {
    state
        .records
        .get_monitor(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("monitor '{name}' not found")))
}

/// PUT /api/v1/monitors/:name
///
/// Creates or fully replaces the monitor
pub async fn save_monitor(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(monitor): Json<Monitor>,
) -> ApiResult<Json<Monitor>> {
    if monitor.alert_name != name {
        return Err(ApiError::InvalidRequest(format!(
            "alert name in body ('{}') does not match path ('{}')",
            monitor.alert_name, name
        )));
    }

    state.records.save_monitor(&monitor).await?;
    Ok(Json(monitor))
}

/// DELETE /api/v1/monitors/:name
pub async fn delete_monitor(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.records.remove_monitor(&name).await? {
        return Err(ApiError::NotFound(format!("monitor '{name}' not found")));
    }

    Ok(Json(DeleteResponse {
        alert_name: name,
        deleted: true,
    }))
}

/// GET /api/v1/monitors/export?names=a,b
pub async fn export_monitors(
    State(state): State<ApiState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let names = query.names();
    let csv = state.records.export_monitors_csv(names.as_deref()).await?;
    Ok(csv_response("monitors.csv", csv))
}

/// POST /api/v1/monitors/import
///
/// Body is a CSV document; invalid rows are reported, not fatal
pub async fn import_monitors(
    State(state): State<ApiState>,
    body: String,
) -> ApiResult<Json<ImportReport>> {
    let report = state.records.import_monitors_csv(body.as_bytes()).await?;
    Ok(Json(report))
}
