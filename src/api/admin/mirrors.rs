use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState};
use crate::constants::mirrors;
use crate::models::{DownloadGroup, DownloadLink, StreamLink};

#[derive(Deserialize)]
pub struct RemoteUploadRequest {
    pub episode_slug: String,
    pub video_url: String,
}

#[derive(Serialize)]
pub struct RemoteUploadDto {
    pub stream: StreamLink,
    pub download: DownloadGroup,
}

/// POST /api/admin/mirrors/remote-upload: hand a source URL to the video
/// host, then append the resulting mirror to the episode. A failed upstream
/// call fails the whole request.
pub async fn remote_upload(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RemoteUploadRequest>,
) -> Result<Json<ApiResponse<RemoteUploadDto>>, ApiError> {
    if payload.episode_slug.trim().is_empty() || payload.video_url.trim().is_empty() {
        return Err(ApiError::validation(
            "Episode slug and video URL are required",
        ));
    }

    let uploader = state.uploader.as_ref().ok_or_else(|| {
        ApiError::NotImplemented("Remote upload is disabled: UPLOADER_API_KEY is not set".to_string())
    })?;

    let hosted = uploader.upload_by_url(&payload.video_url).await?;

    let stream = StreamLink {
        name: "Mirror".to_string(),
        url: hosted.embed_url,
    };
    let download = DownloadGroup {
        quality: "480p".to_string(),
        links: vec![DownloadLink {
            host: "Mirror".to_string(),
            url: hosted.download_url,
        }],
    };

    let updated = state
        .store
        .push_mirror(&payload.episode_slug, stream.clone(), download.clone())
        .await?;

    if !updated {
        return Err(ApiError::episode_not_found(&payload.episode_slug));
    }

    tracing::info!("Remote upload attached to {}", payload.episode_slug);
    Ok(Json(ApiResponse::success(RemoteUploadDto {
        stream,
        download,
    })))
}

#[derive(Serialize)]
pub struct ClearMirrorsDto {
    pub modified: u64,
}

/// POST /api/admin/mirrors/clear: strip the well-known remote-upload
/// mirror names and qualities across every episode.
pub async fn clear(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ClearMirrorsDto>>, ApiError> {
    let modified = state
        .store
        .clear_mirrors(mirrors::STREAM_NAMES, mirrors::DOWNLOAD_QUALITIES)
        .await?;

    Ok(Json(ApiResponse::success(ClearMirrorsDto { modified })))
}
