use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState, PaginationDto};
use crate::constants::pagination::ADMIN_LISTING;
use crate::db::{CatalogEntryUpdate, CatalogRepository, NewCatalogEntry};
use crate::models::{CatalogEntry, EntryInfo, EpisodeRef};
use crate::services::listing::clamp_page;
use crate::slug::slugify;

/// Admin payloads carry the stored values verbatim; the public encoding
/// pass only applies to public-facing surfaces.
#[derive(Serialize)]
pub struct AdminSeriesDto {
    pub slug: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub image_url: Option<String>,
    pub synopsis: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub released: Option<String>,
    pub studio: Option<String>,
    pub producers: Option<String>,
    pub episode_total: Option<String>,
    pub genres: Vec<String>,
    pub episodes: Vec<EpisodeRef>,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CatalogEntry> for AdminSeriesDto {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            slug: entry.slug,
            title: entry.title,
            alt_title: entry.alt_title,
            image_url: entry.image_url,
            synopsis: entry.synopsis,
            kind: entry.info.kind,
            status: entry.info.status,
            released: entry.info.released,
            studio: entry.info.studio,
            producers: entry.info.producers,
            episode_total: entry.info.episode_total,
            genres: entry.genres,
            episodes: entry.episodes,
            view_count: entry.view_count,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct AdminSeriesListDto {
    pub results: Vec<AdminSeriesDto>,
    pub pagination: PaginationDto,
}

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub page: Option<String>,
    pub search: Option<String>,
}

/// GET /api/admin/series: paged, searchable over title and slug.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<ApiResponse<AdminSeriesListDto>>, ApiError> {
    let page = state
        .store
        .entry_page(
            CatalogRepository::admin_search(query.search.as_deref()),
            clamp_page(query.page.as_deref()),
            ADMIN_LISTING,
        )
        .await?;

    Ok(Json(ApiResponse::success(AdminSeriesListDto {
        pagination: PaginationDto::from_page(&page),
        results: page.items.into_iter().map(AdminSeriesDto::from).collect(),
    })))
}

#[derive(Deserialize)]
pub struct CreateSeriesRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub alt_title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub studio: Option<String>,
    #[serde(default)]
    pub producers: Option<String>,
    #[serde(default)]
    pub episode_total: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// POST /api/admin/series
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSeriesRequest>,
) -> Result<Json<ApiResponse<AdminSeriesDto>>, ApiError> {
    if payload.title.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(ApiError::validation("Title and slug are required"));
    }

    // The slug is the immutable identity key; reject anything that is not
    // already in canonical URL-safe form.
    if slugify(&payload.slug) != payload.slug {
        return Err(ApiError::validation(format!(
            "Slug '{}' is not URL-safe; try '{}'",
            payload.slug,
            slugify(&payload.slug)
        )));
    }

    if state.store.entry_exists(&payload.slug).await? {
        return Err(ApiError::Conflict(format!(
            "Slug '{}' is already in use",
            payload.slug
        )));
    }

    let entry = state
        .store
        .add_entry(NewCatalogEntry {
            slug: payload.slug,
            title: payload.title,
            alt_title: payload.alt_title,
            image_url: payload.image_url,
            synopsis: payload.synopsis,
            info: EntryInfo {
                kind: payload.kind,
                status: payload.status,
                released: payload.released,
                studio: payload.studio,
                producers: payload.producers,
                episode_total: payload.episode_total,
            },
            genres: payload.genres,
        })
        .await?;

    Ok(Json(ApiResponse::success(entry.into())))
}

/// GET /api/admin/series/{slug}
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<AdminSeriesDto>>, ApiError> {
    let entry = state
        .store
        .get_entry(&slug)
        .await?
        .ok_or_else(|| ApiError::series_not_found(&slug))?;

    Ok(Json(ApiResponse::success(entry.into())))
}

#[derive(Deserialize, Default)]
pub struct UpdateSeriesRequest {
    pub title: Option<String>,
    pub alt_title: Option<String>,
    pub image_url: Option<String>,
    pub synopsis: Option<String>,
    pub kind: Option<String>,
    pub status: Option<String>,
    pub released: Option<String>,
    pub studio: Option<String>,
    pub producers: Option<String>,
    pub episode_total: Option<String>,
    pub genres: Option<Vec<String>>,
}

/// PUT /api/admin/series/{slug}: partial update; empty strings are treated
/// as "leave unchanged", matching the edit-form semantics.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateSeriesRequest>,
) -> Result<Json<ApiResponse<AdminSeriesDto>>, ApiError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let changes = CatalogEntryUpdate {
        title: non_empty(payload.title),
        alt_title: non_empty(payload.alt_title),
        image_url: non_empty(payload.image_url),
        synopsis: non_empty(payload.synopsis),
        kind: non_empty(payload.kind),
        status: non_empty(payload.status),
        released: non_empty(payload.released),
        studio: non_empty(payload.studio),
        producers: non_empty(payload.producers),
        episode_total: non_empty(payload.episode_total),
        genres: payload.genres,
    };

    let entry = state
        .store
        .update_entry(&slug, changes)
        .await?
        .ok_or_else(|| ApiError::series_not_found(&slug))?;

    Ok(Json(ApiResponse::success(entry.into())))
}

#[derive(Serialize)]
pub struct RemovedDto {
    pub removed: bool,
}

/// DELETE /api/admin/series/{slug}: cascades to episodes and reports.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<RemovedDto>>, ApiError> {
    if !state.store.remove_entry(&slug).await? {
        return Err(ApiError::series_not_found(&slug));
    }

    Ok(Json(ApiResponse::success(RemovedDto { removed: true })))
}
