//! Schedule endpoints (read-only)

use axum::{
    Json,
    extract::{Query, State},
    response::Response,
};

use crate::api::{error::ApiResult, state::ApiState, types::ExportQuery};
use crate::model::ScheduleEntry;

use super::csv_response;

/// GET /api/v1/schedule
pub async fn list_schedule(State(state): State<ApiState>) -> ApiResult<Json<Vec<ScheduleEntry>>> {
    Ok(Json(state.records.list_schedule().await?))
}

/// GET /api/v1/schedule/export?names=a,b
pub async fn export_schedule(
    State(state): State<ApiState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let names = query.names();
    let csv = state.records.export_schedule_csv(names.as_deref()).await?;
    Ok(csv_response("schedule.csv", csv))
}
