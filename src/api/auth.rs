use axum::{
    Json,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use url::Url;

use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::constants::sessions::{USER_ID_KEY, USERNAME_KEY};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gate for session-only endpoints; unauthenticated callers get 401 JSON.
pub async fn require_user(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = session
        .get::<i32>(USER_ID_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if user_id.is_none() {
        return Err(ApiError::login_required());
    }
    Ok(next.run(request).await)
}

/// Same-origin Referer check for feed endpoints consumed by the site's own
/// widgets. Absent, unparseable and foreign referers are all 403.
pub async fn require_same_origin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let allowed_host = Url::parse(state.site_url())
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .ok_or_else(|| ApiError::internal("SITE_URL is not a valid URL"))?;

    let referer_host = request
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| Url::parse(raw).ok())
        .and_then(|u| u.host_str().map(ToString::to_string));

    match referer_host {
        Some(host) if host == allowed_host => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Forbidden("Access denied (hotlinking)".to_string())),
        None => Err(ApiError::Forbidden(
            "Access denied (direct access)".to_string(),
        )),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters",
        ));
    }

    if state.store.get_user_by_username(username).await?.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let user = state.store.create_user(username, &payload.password).await?;
    start_session(&session, user.id, &user.username).await?;

    tracing::info!("Registered user: {}", user.username);
    Ok(Json(ApiResponse::success(UserDto {
        id: user.id,
        username: user.username,
    })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let is_valid = state
        .store
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let user = state
        .store
        .get_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    start_session(&session, user.id, &user.username).await?;

    Ok(Json(ApiResponse::success(UserDto {
        id: user.id,
        username: user.username,
    })))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    Json(ApiResponse::success("Logged out"))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user_id = current_user_id(&session).await?.ok_or_else(ApiError::login_required)?;

    let user = state
        .store
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(ApiError::login_required)?;

    Ok(Json(ApiResponse::success(UserDto {
        id: user.id,
        username: user.username,
    })))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, user_id: i32, username: &str) -> Result<(), ApiError> {
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(USERNAME_KEY, username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    Ok(())
}

pub async fn current_user_id(session: &Session) -> Result<Option<i32>, ApiError> {
    session
        .get::<i32>(USER_ID_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))
}
