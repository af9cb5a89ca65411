use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SeriesSummaryDto, WatchDto};
use crate::constants::pagination::RECOMMENDATION_LIMIT;
use crate::services::navigation;

#[derive(Serialize)]
pub struct WatchPageDto {
    #[serde(flatten)]
    pub episode: WatchDto,
    pub recommendations: Vec<SeriesSummaryDto>,
}

/// GET /watch/{series}/{number}: the episode itself 404s when absent; a
/// missing parent entry only degrades navigation to null.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path((series, number)): Path<(String, String)>,
) -> Result<Json<ApiResponse<WatchPageDto>>, ApiError> {
    let slug = format!("/{series}/{number}");

    let episode = state
        .store
        .get_episode(&slug)
        .await?
        .ok_or_else(|| ApiError::episode_not_found(&slug))?;

    let (parent, recommendations) = tokio::try_join!(
        state.store.get_entry(&episode.series_slug),
        state
            .store
            .random_entries(RECOMMENDATION_LIMIT, Some(&episode.series_slug)),
    )?;

    let nav = navigation::resolve(parent.as_ref(), &slug);

    let site_url = state.site_url();
    Ok(Json(ApiResponse::success(WatchPageDto {
        episode: WatchDto::from_record(&episode, nav, site_url),
        recommendations: recommendations
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    })))
}
