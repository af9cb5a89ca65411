use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, auth};

#[derive(Deserialize)]
pub struct CreateReportRequest {
    pub page_url: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ReportCreatedDto {
    pub id: i32,
}

/// POST /reports: file an error report against a page.
pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateReportRequest>,
) -> Result<Json<ApiResponse<ReportCreatedDto>>, ApiError> {
    let user_id = auth::current_user_id(&session)
        .await?
        .ok_or_else(ApiError::login_required)?;

    if payload.page_url.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(ApiError::validation("A report needs a page and a message"));
    }

    let report = state
        .store
        .create_report(payload.page_url.trim(), payload.message.trim(), Some(user_id))
        .await?;

    tracing::info!("Report {} filed for {}", report.id, report.page_url);
    Ok(Json(ApiResponse::success(ReportCreatedDto { id: report.id })))
}
