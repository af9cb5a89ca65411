//! Widget feeds consumed by the site's own pages. All three sit behind the
//! same-origin Referer gate.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SeriesSummaryDto};
use crate::constants::pagination::{HIGHLIGHT_LIMIT, POPULAR_LIMIT};
use crate::db::CatalogRepository;
use crate::models::CatalogEntry;

#[derive(Deserialize)]
pub struct PopularQuery {
    pub range: Option<String>,
}

/// GET /popular?range=weekly|monthly|all: view-count ranking within the
/// requested recency window. Unknown ranges fall back to weekly.
pub async fn popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<ApiResponse<Vec<SeriesSummaryDto>>>, ApiError> {
    let since = match query.range.as_deref() {
        Some("all") => None,
        Some("monthly") => Some((Utc::now() - Duration::days(30)).to_rfc3339()),
        _ => Some((Utc::now() - Duration::days(7)).to_rfc3339()),
    };

    let entries = state.store.popular_entries(since, POPULAR_LIMIT).await?;
    Ok(summaries(&state, &entries))
}

/// GET /highlights/this-year: newest entries released this calendar year.
pub async fn this_year(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SeriesSummaryDto>>>, ApiError> {
    let year = Utc::now().year().to_string();

    let page = state
        .store
        .entry_page(CatalogRepository::released_in(&year), 1, HIGHLIGHT_LIMIT)
        .await?;

    Ok(summaries(&state, &page.items))
}

/// GET /highlights/uncensored: newest entries carrying the genre.
pub async fn uncensored(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SeriesSummaryDto>>>, ApiError> {
    let page = state
        .store
        .entry_page(
            CatalogRepository::with_genre("Uncensored"),
            1,
            HIGHLIGHT_LIMIT,
        )
        .await?;

    Ok(summaries(&state, &page.items))
}

fn summaries(
    state: &AppState,
    entries: &[CatalogEntry],
) -> Json<ApiResponse<Vec<SeriesSummaryDto>>> {
    let site_url = state.site_url();
    Json(ApiResponse::success(
        entries
            .iter()
            .map(|entry| SeriesSummaryDto::from_entry(entry, site_url))
            .collect(),
    ))
}
