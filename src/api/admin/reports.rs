use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState, ReportDto};

/// GET /api/admin/reports: newest first, reporter usernames included.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ReportDto>>>, ApiError> {
    let rows = state.store.list_reports().await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter()
            .map(|row| ReportDto {
                id: row.model.id,
                page_url: row.model.page_url,
                message: row.model.message,
                status: row.model.status,
                username: row.username,
                created_at: row.model.created_at,
            })
            .collect(),
    )))
}

/// DELETE /api/admin/reports/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    if !state.store.remove_report(id).await? {
        return Err(ApiError::not_found("Report", id));
    }

    Ok(Json(ApiResponse::success(true)))
}
