use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::clients::StreamHostClient;
use crate::config::Config;
use crate::constants::sessions;
use crate::db::Store;
use crate::services::TaxonomyCache;

pub mod admin;
mod assets;
pub mod auth;
mod bookmarks;
mod browse;
mod catalog;
mod error;
mod highlights;
mod home;
mod observability;
mod redirects;
mod reports;
mod seo;
mod types;
mod watch;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub taxonomy: TaxonomyCache,

    /// Present only when an uploader API key is configured.
    pub uploader: Option<StreamHostClient>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.config.site.url
    }
}

pub async fn create_app_state(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;

    let taxonomy = TaxonomyCache::new(
        store.clone(),
        Duration::from_secs(config.cache.taxonomy_ttl_seconds),
    );

    let uploader = match &config.uploader.api_key {
        Some(key) => Some(StreamHostClient::new(&config.uploader, key.clone())?),
        None => None,
    };

    Ok(Arc::new(AppState {
        config,
        store,
        taxonomy,
        uploader,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let session_store = SqliteStore::new(state.store.conn.get_sqlite_connection_pool().clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            sessions::TTL_DAYS,
        )));

    let api_router = Router::new()
        .nest("/v1", public_router(state.clone()))
        .nest("/admin", admin::router())
        .layer(session_layer)
        .with_state(state.clone());

    let cors_origins = &state.config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let images_path = state.config.general.images_path.clone();

    Ok(Router::new()
        .nest("/api", api_router)
        .merge(seo_router(state.clone()))
        .merge(redirects::router())
        .nest_service("/images", ServeDir::new(images_path))
        .fallback(assets::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests)))
}

fn public_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Feed endpoints consumed by the site's own widgets; gated by a
    // same-origin Referer check against hotlinking.
    let referer_gated = Router::new()
        .route("/popular", get(highlights::popular))
        .route("/highlights/this-year", get(highlights::this_year))
        .route("/highlights/uncensored", get(highlights::uncensored))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_same_origin,
        ));

    let session_gated = Router::new()
        .route("/bookmarks", get(bookmarks::list).delete(bookmarks::clear))
        .route(
            "/bookmarks/{entry_id}",
            put(bookmarks::save).delete(bookmarks::remove),
        )
        .route("/bookmarks/{entry_id}/status", get(bookmarks::status))
        .route("/reports", post(reports::create))
        .route_layer(middleware::from_fn(auth::require_user));

    Router::new()
        .route("/home", get(home::feed))
        .route("/catalog", get(catalog::list))
        .route("/search", get(catalog::search))
        .route("/random", get(catalog::random))
        .route("/series/{slug}", get(catalog::detail))
        .route("/watch/{series}/{number}", get(watch::detail))
        .route("/genres", get(browse::genre_list))
        .route("/years", get(browse::year_list))
        .route("/genre/{slug}", get(browse::by_genre))
        .route("/status/{slug}", get(browse::by_status))
        .route("/type/{slug}", get(browse::by_kind))
        .route("/studio/{slug}", get(browse::by_studio))
        .route("/year/{year}", get(browse::by_year))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .merge(referer_gated)
        .merge(session_gated)
}

fn seo_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/robots.txt", get(seo::robots_txt))
        .route("/sitemap_index.xml", get(seo::sitemap_index))
        .route("/sitemap-static.xml", get(seo::sitemap_static))
        .route("/sitemap-series.xml", get(seo::sitemap_series))
        .route("/sitemap-episodes.xml", get(seo::sitemap_episodes))
        .route("/sitemap-taxonomies.xml", get(seo::sitemap_taxonomies))
        .with_state(state)
}
