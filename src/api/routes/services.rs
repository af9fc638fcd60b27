//! Service endpoints

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
use crate::model::Service;

use super::csv_response;

/// GET /api/v1/services
pub async fn list_services(State(state): State<ApiState>) -> ApiResult<Json<Vec<Service>>> {
    Ok(Json(state.records.list_services().await?))
}

/// POST /api/v1/services
pub async fn create_service(
    State(state): State<ApiState>,
    Json(service): Json<Service>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    state.records.add_service(&service).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// GET /api/v1/services/:name
pub async fn get_service(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Service>> {
    state
        .records
        .get_service(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("service '{name}' not found")))
}

/// PUT /api/v1/services/:name
pub async fn save_service(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(service): Json<Service>,
) -> ApiResult<Json<Service>> {
    if service.alert_name != name {
        return Err(ApiError::InvalidRequest(format!(
            "alert name in body ('{}') does not match path ('{}')",
            service.alert_name, name
        )));
    }

    state.records.save_service(&service).await?;
    Ok(Json(service))
}

/// DELETE /api/v1/services/:name
pub async fn delete_service(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.records.remove_service(&name).await? {
        return Err(ApiError::NotFound(format!("service '{name}' not found")));
    }

    Ok(Json(DeleteResponse {
        alert_name: name,
        deleted: true,
    }))
}

/// GET /api/v1/services/export?names=a,b
pub async fn export_services(
    State(state): State<ApiState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let names = query.names();
    let csv = state.records.export_services_csv(names.as_deref()).await?;
    Ok(csv_response("services.csv", csv))
}

/// POST /api/v1/services/import
pub async fn import_services(
    State(state): State<ApiState>,
    body: String,
) -> ApiResult<Json<ImportReport>> {
    let report = state.records.import_services_csv(body.as_bytes()).await?;
    Ok(Json(report))
}
