//! Operator back office. Everything except login sits behind a session-flag
//! guard; there is no admin user row, credentials come from the environment.

use axum::{
    Json, Router,
    extract::{Request, State},
    middleware,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, auth::CredentialsRequest, observability};
use crate::constants::sessions::ADMIN_KEY;

mod backup;
mod catalog;
mod episodes;
mod mirrors;
mod reports;

pub fn router() -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/series", get(catalog::list).post(catalog::create))
        .route(
            "/series/{slug}",
            get(catalog::fetch).put(catalog::update).delete(catalog::remove),
        )
        .route("/series/{slug}/episodes", post(episodes::create))
        .route("/episodes", get(episodes::list))
        .route(
            "/episodes/{series}/{number}",
            get(episodes::fetch)
                .put(episodes::update)
                .delete(episodes::remove),
        )
        .route("/backup/export", get(backup::export))
        .route("/backup/import", post(backup::import))
        .route("/mirrors/remote-upload", post(mirrors::remote_upload))
        .route("/mirrors/clear", post(mirrors::clear))
        .route("/reports", get(reports::list))
        .route("/reports/{id}", delete(reports::remove))
        .route("/metrics", get(observability::metrics))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .merge(protected)
}

async fn require_admin(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let is_admin = session
        .get::<bool>(ADMIN_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .unwrap_or(false);

    if !is_admin {
        return Err(ApiError::Unauthorized(
            "Administrator session required".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// POST /api/admin/login: checked against the environment credentials.
async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let admin = &state.config.admin;

    if payload.username != admin.username || payload.password != admin.password {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    session
        .insert(ADMIN_KEY, true)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("Administrator logged in");
    Ok(Json(ApiResponse::success("Logged in")))
}

/// POST /api/admin/logout
async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Json(ApiResponse::success("Logged out"))
}

#[derive(Serialize)]
struct DashboardDto {
    total_series: u64,
    total_episodes: u64,
    total_users: u64,
    total_reports: u64,
    uptime_seconds: u64,
}

/// GET /api/admin/dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let (total_series, total_episodes, total_users, total_reports) = tokio::try_join!(
        state.store.count_entries(),
        state.store.count_episodes(),
        state.store.count_users(),
        state.store.count_reports(),
    )?;

    Ok(Json(ApiResponse::success(DashboardDto {
        total_series,
        total_episodes,
        total_users,
        total_reports,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })))
}
