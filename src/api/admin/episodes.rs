use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState, PaginationDto};
use crate::constants::pagination::ADMIN_LISTING;
use crate::db::{EpisodeRepository, EpisodeUpdate, NewEpisode};
use crate::models::{DownloadGroup, EpisodeRecord, EpisodeRef, StreamLink};
use crate::services::PageQuery;

/// Raw stored form, mirrors included; the admin surface edits what the
/// public surface obfuscates.
#[derive(Serialize)]
pub struct AdminEpisodeDto {
    pub slug: String,
    pub title: Option<String>,
    pub series_slug: String,
    pub series_title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub aired_label: Option<String>,
    pub streams: Vec<StreamLink>,
    pub downloads: Vec<DownloadGroup>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<EpisodeRecord> for AdminEpisodeDto {
    fn from(record: EpisodeRecord) -> Self {
        Self {
            slug: record.slug,
            title: record.title,
            series_slug: record.series_slug,
            series_title: record.series_title,
            thumbnail_url: record.thumbnail_url,
            aired_label: record.aired_label,
            streams: record.streams,
            downloads: record.downloads,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct AdminEpisodeListDto {
    pub results: Vec<AdminEpisodeDto>,
    pub pagination: PaginationDto,
}

/// GET /api/admin/episodes: most recently edited first.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<AdminEpisodeListDto>>, ApiError> {
    let page = state
        .store
        .episode_page(
            EpisodeRepository::recently_updated(),
            query.page(),
            ADMIN_LISTING,
        )
        .await?;

    Ok(Json(ApiResponse::success(AdminEpisodeListDto {
        pagination: PaginationDto::from_page(&page),
        results: page.items.into_iter().map(AdminEpisodeDto::from).collect(),
    })))
}

#[derive(Deserialize)]
pub struct CreateEpisodeRequest {
    pub title: String,
    pub number: u32,
    #[serde(default)]
    pub date: Option<String>,
}

/// POST /api/admin/series/{slug}/episodes: creates the episode row and
/// appends the matching ref to the parent's embedded ordered list.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(series_slug): Path<String>,
    Json(payload): Json<CreateEpisodeRequest>,
) -> Result<Json<ApiResponse<AdminEpisodeDto>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Episode title is required"));
    }

    let parent = state
        .store
        .get_entry(&series_slug)
        .await?
        .ok_or_else(|| ApiError::series_not_found(&series_slug))?;

    let slug = format!("/{}/{}", series_slug, payload.number);
    if state.store.episode_exists(&slug).await? {
        return Err(ApiError::Conflict(format!(
            "Episode slug '{slug}' is already in use"
        )));
    }

    let date = payload
        .date
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

    let record = state
        .store
        .add_episode(NewEpisode {
            slug: slug.clone(),
            title: Some(payload.title.clone()),
            series_slug: series_slug.clone(),
            series_title: Some(parent.title.clone()),
            series_image_url: parent.image_url.clone(),
            thumbnail_url: None,
            aired_label: Some(date.clone()),
        })
        .await?;

    state
        .store
        .append_episode_ref(
            &series_slug,
            EpisodeRef {
                title: payload.title,
                url: slug,
                date: Some(date),
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(record.into())))
}

/// GET /api/admin/episodes/{series}/{number}
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Path((series, number)): Path<(String, String)>,
) -> Result<Json<ApiResponse<AdminEpisodeDto>>, ApiError> {
    let slug = format!("/{series}/{number}");

    let record = state
        .store
        .get_episode(&slug)
        .await?
        .ok_or_else(|| ApiError::episode_not_found(&slug))?;

    Ok(Json(ApiResponse::success(record.into())))
}

#[derive(Deserialize, Default)]
pub struct UpdateEpisodeRequest {
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub aired_label: Option<String>,
    pub streams: Option<Vec<StreamLink>>,
    pub downloads: Option<Vec<DownloadGroup>>,
}

/// PUT /api/admin/episodes/{series}/{number}: mirror lists replace
/// wholesale; blank rows from the edit form are dropped.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((series, number)): Path<(String, String)>,
    Json(payload): Json<UpdateEpisodeRequest>,
) -> Result<Json<ApiResponse<AdminEpisodeDto>>, ApiError> {
    let slug = format!("/{series}/{number}");

    let streams = payload.streams.map(|links| {
        links
            .into_iter()
            .filter(|s| !s.name.trim().is_empty() && !s.url.trim().is_empty())
            .collect::<Vec<_>>()
    });

    let downloads = payload.downloads.map(|groups| {
        groups
            .into_iter()
            .filter(|g| !g.quality.trim().is_empty())
            .map(|mut g| {
                g.links
                    .retain(|l| !l.host.trim().is_empty() && !l.url.trim().is_empty());
                g
            })
            .filter(|g| !g.links.is_empty())
            .collect::<Vec<_>>()
    });

    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let record = state
        .store
        .update_episode(
            &slug,
            EpisodeUpdate {
                title: non_empty(payload.title),
                thumbnail_url: non_empty(payload.thumbnail_url),
                aired_label: non_empty(payload.aired_label),
                streams,
                downloads,
            },
        )
        .await?
        .ok_or_else(|| ApiError::episode_not_found(&slug))?;

    Ok(Json(ApiResponse::success(record.into())))
}

#[derive(Serialize)]
pub struct RemovedEpisodeDto {
    pub removed: bool,
    pub parent_updated: bool,
}

/// DELETE /api/admin/episodes/{series}/{number}: removes the row and the
/// parent's embedded ref.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path((series, number)): Path<(String, String)>,
) -> Result<Json<ApiResponse<RemovedEpisodeDto>>, ApiError> {
    let slug = format!("/{series}/{number}");

    let record = state
        .store
        .get_episode(&slug)
        .await?
        .ok_or_else(|| ApiError::episode_not_found(&slug))?;

    let removed = state.store.remove_episode(&slug).await?;
    let parent_updated = state
        .store
        .remove_episode_ref(&record.series_slug, &slug)
        .await?;

    Ok(Json(ApiResponse::success(RemovedEpisodeDto {
        removed,
        parent_updated,
    })))
}
