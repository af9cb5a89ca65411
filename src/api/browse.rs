//! Taxonomy-filtered listings. Every slug resolves through the distinct-value
//! cache back to the stored original, then filters the catalog with the
//! normalized columns.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use sea_orm::Select;
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ListingDto, PaginationDto, SeriesSummaryDto};
use crate::constants::pagination::API_LISTING;
use crate::db::CatalogRepository;
use crate::entities::prelude::CatalogEntries;
use crate::services::{PageQuery, TaxonomyField};

#[derive(Serialize)]
pub struct TermListDto {
    pub terms: Vec<String>,
    pub total: usize,
}

/// GET /genres: all genres, alphabetical.
pub async fn genre_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TermListDto>>, ApiError> {
    let mut genres = state.taxonomy.distinct_values(TaxonomyField::Genres).await?;
    genres.sort_unstable();

    Ok(Json(ApiResponse::success(TermListDto {
        total: genres.len(),
        terms: genres,
    })))
}

/// GET /years: release years, newest first.
pub async fn year_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TermListDto>>, ApiError> {
    let years = state.taxonomy.release_years().await?;

    Ok(Json(ApiResponse::success(TermListDto {
        total: years.len(),
        terms: years,
    })))
}

pub async fn by_genre(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    let genre = resolve(&state, TaxonomyField::Genres, &slug, "Genre").await?;
    listing(
        &state,
        CatalogRepository::with_genre(&genre),
        format!("Genre: {genre}"),
        &query,
    )
    .await
}

pub async fn by_status(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    let status = resolve(&state, TaxonomyField::Status, &slug, "Status").await?;
    listing(
        &state,
        CatalogRepository::with_status(&status),
        format!("Status: {status}"),
        &query,
    )
    .await
}

pub async fn by_kind(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    let kind = resolve(&state, TaxonomyField::Kind, &slug, "Type").await?;
    listing(
        &state,
        CatalogRepository::with_kind(&kind),
        format!("Type: {kind}"),
        &query,
    )
    .await
}

pub async fn by_studio(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    let studio = resolve(&state, TaxonomyField::Studio, &slug, "Studio").await?;
    listing(
        &state,
        CatalogRepository::with_studio(&studio),
        format!("Studio: {studio}"),
        &query,
    )
    .await
}

/// GET /year/{year}: the year filter matches inside free-text release
/// strings, so it only validates shape instead of resolving a slug.
pub async fn by_year(
    State(state): State<Arc<AppState>>,
    Path(year): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::not_found("Year", &year));
    }

    listing(
        &state,
        CatalogRepository::released_in(&year),
        format!("Year: {year}"),
        &query,
    )
    .await
}

async fn resolve(
    state: &AppState,
    field: TaxonomyField,
    slug: &str,
    label: &str,
) -> Result<String, ApiError> {
    state
        .taxonomy
        .resolve_slug(field, slug)
        .await?
        .ok_or_else(|| ApiError::not_found(label, slug))
}

async fn listing(
    state: &AppState,
    select: Select<CatalogEntries>,
    title: String,
    query: &PageQuery,
) -> Result<Json<ApiResponse<ListingDto<SeriesSummaryDto>>>, ApiError> {
    let page = state
        .store
        .entry_page(select, query.page(), API_LISTING)
        .await?;

    let site_url = state.site_url();
    Ok(Json(ApiResponse::success(ListingDto {
        title: Some(title),
        pagination: PaginationDto::from_page(&page),
        results: page
            .items
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    })))
}
