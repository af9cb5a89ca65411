use axum::{
    Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Serialize;
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, ListingDto, PaginationDto, SearchQuery, SeriesDetailDto,
    SeriesSummaryDto,
};
use crate::constants::pagination::{API_LISTING, ITEMS_PER_PAGE};
use crate::constants::{SERIES_PREFIX, pagination};
use crate::db::CatalogRepository;
use crate::services::listing::clamp_page;
use crate::services::{PageQuery, views};

#[derive(Serialize)]
pub struct CatalogListingDto {
    pub results: Vec<SeriesSummaryDto>,
    pub latest_series: Vec<SeriesSummaryDto>,
    pub pagination: PaginationDto,
}

/// GET /catalog: the full list. Keeps the legacy ascending insertion order.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<CatalogListingDto>>, ApiError> {
    let (page, latest_series) = tokio::try_join!(
        state
            .store
            .entry_page(CatalogRepository::oldest_first(), query.page(), ITEMS_PER_PAGE),
        state.store.latest_rail(),
    )?;

    let site_url = state.site_url();
    let listing = CatalogListingDto {
        pagination: PaginationDto::from_page(&page),
        results: page
            .items
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
        latest_series: latest_series
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    };

    Ok(Json(ApiResponse::success(listing)))
}

/// GET /search?q=: case-insensitive title substring match.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("Search query (q) is required"))?;

    let page = state
        .store
        .entry_page(
            CatalogRepository::search(term),
            clamp_page(query.page.as_deref()),
            API_LISTING,
        )
        .await?;

    let site_url = state.site_url();
    let listing = ListingDto {
        title: Some(format!("Search: {term}")),
        pagination: PaginationDto::from_page(&page),
        results: page
            .items
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    };

    Ok(Json(ApiResponse::success(listing)))
}

#[derive(Serialize)]
pub struct SeriesPageDto {
    #[serde(flatten)]
    pub series: SeriesDetailDto,
    pub recommendations: Vec<SeriesSummaryDto>,
}

/// GET /series/{slug}: detail page data. The view counter increments in a
/// detached task; the response never waits for it.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<SeriesPageDto>>, ApiError> {
    let entry = state
        .store
        .get_entry(&slug)
        .await?
        .ok_or_else(|| ApiError::series_not_found(&slug))?;

    views::record_view(&state.store, &slug);

    let recommendations = state
        .store
        .random_entries(pagination::LATEST_SERIES_RAIL, Some(&slug))
        .await?;

    let site_url = state.site_url();
    Ok(Json(ApiResponse::success(SeriesPageDto {
        series: SeriesDetailDto::from_entry(&entry, site_url),
        recommendations: recommendations
            .iter()
            .map(|e| SeriesSummaryDto::from_entry(e, site_url))
            .collect(),
    })))
}

/// GET /random: bounce to a random series page.
pub async fn random(State(state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
    let picks = state.store.random_entries(1, None).await?;

    let target = picks
        .first()
        .map_or_else(|| "/".to_string(), |entry| {
            format!("{SERIES_PREFIX}/{}", entry.slug)
        });

    Ok(Redirect::temporary(&target))
}
