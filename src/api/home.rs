use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, LatestEpisodeDto, PaginationDto, SeriesSummaryDto,
};
use crate::constants::pagination::ITEMS_PER_PAGE;
use crate::db::EpisodeRepository;
use crate::services::PageQuery;

#[derive(Serialize)]
pub struct HomeFeedDto {
    pub episodes: Vec<LatestEpisodeDto>,
    pub latest_series: Vec<SeriesSummaryDto>,
    pub pagination: PaginationDto,
}

/// GET /home: newest episodes, paginated, plus a rail of the latest series.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<HomeFeedDto>>, ApiError> {
    let (episodes, latest_series) = tokio::try_join!(
        state
            .store
            .episode_page(EpisodeRepository::newest_first(), query.page(), ITEMS_PER_PAGE),
        state.store.latest_rail(),
    )?;

    let site_url = state.site_url();
    let feed = HomeFeedDto {
        pagination: PaginationDto::from_page(&episodes),
        episodes: episodes
            .items
            .iter()
            .map(|ep| LatestEpisodeDto::from_record(ep, site_url))
            .collect(),
        latest_series: latest_series
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    };

    Ok(Json(ApiResponse::success(feed)))
}
