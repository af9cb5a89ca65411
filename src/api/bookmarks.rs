use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, SeriesSummaryDto, auth};

#[derive(Serialize)]
pub struct BookmarkStateDto {
    pub bookmarked: bool,
}

#[derive(Serialize)]
pub struct ClearedDto {
    pub deleted: u64,
}

async fn session_user(session: &Session) -> Result<i32, ApiError> {
    auth::current_user_id(session)
        .await?
        .ok_or_else(ApiError::login_required)
}

/// GET /bookmarks: the caller's saved entries, newest first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<SeriesSummaryDto>>>, ApiError> {
    let user_id = session_user(&session).await?;
    let entries = state.store.bookmarked_entries(user_id).await?;

    let site_url = state.site_url();
    Ok(Json(ApiResponse::success(
        entries
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    )))
}

/// PUT /bookmarks/{entry_id}: upsert; repeat saves are no-ops.
pub async fn save(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(entry_id): Path<i32>,
) -> Result<Json<ApiResponse<BookmarkStateDto>>, ApiError> {
    let user_id = session_user(&session).await?;

    state.store.add_bookmark(user_id, entry_id).await?;
    Ok(Json(ApiResponse::success(BookmarkStateDto {
        bookmarked: true,
    })))
}

/// DELETE /bookmarks/{entry_id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(entry_id): Path<i32>,
) -> Result<Json<ApiResponse<BookmarkStateDto>>, ApiError> {
    let user_id = session_user(&session).await?;

    state.store.remove_bookmark(user_id, entry_id).await?;
    Ok(Json(ApiResponse::success(BookmarkStateDto {
        bookmarked: false,
    })))
}

/// DELETE /bookmarks: clear everything for the caller.
pub async fn clear(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<ClearedDto>>, ApiError> {
    let user_id = session_user(&session).await?;

    let deleted = state.store.clear_bookmarks(user_id).await?;
    tracing::info!("Cleared {} bookmarks for user {}", deleted, user_id);
    Ok(Json(ApiResponse::success(ClearedDto { deleted })))
}

/// GET /bookmarks/{entry_id}/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(entry_id): Path<i32>,
) -> Result<Json<ApiResponse<BookmarkStateDto>>, ApiError> {
    let user_id = session_user(&session).await?;

    let bookmarked = state.store.is_bookmarked(user_id, entry_id).await?;
    Ok(Json(ApiResponse::success(BookmarkStateDto { bookmarked })))
}
