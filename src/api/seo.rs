//! robots.txt and the sitemap family. The two big sitemaps (series,
//! episodes) stream one `<url>` element per row from a forward-only cursor;
//! header and footer are always emitted, even over an empty table. Once the
//! headers are flushed the status can no longer change, so a mid-stream
//! database error just terminates the body.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt, channel::mpsc};
use quick_xml::escape::escape;
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, StreamTrait};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use crate::constants::WATCH_PREFIX;
use crate::entities::{catalog_entries, episodes, prelude::*};
use crate::services::TaxonomyField;
use crate::slug::slugify;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const URLSET_OPEN: &str =
    r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#;
const URLSET_CLOSE: &str = "</urlset>";

type Chunk = Result<Bytes, Infallible>;

/// GET /robots.txt
pub async fn robots_txt(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = format!(
        "User-agent: *\n\
         Allow: /\n\
         \n\
         Disallow: /admin/\n\
         Disallow: /api/\n\
         Disallow: /search\n\
         \n\
         Sitemap: {}/sitemap_index.xml\n",
        state.site_url()
    );

    ([(header::CONTENT_TYPE, "text/plain")], body)
}

/// GET /sitemap_index.xml
pub async fn sitemap_index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let lastmod = today();
    let mut body = String::from(XML_DECL);
    body.push_str(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);

    for sitemap in [
        "sitemap-static.xml",
        "sitemap-series.xml",
        "sitemap-episodes.xml",
        "sitemap-taxonomies.xml",
    ] {
        body.push_str(&format!(
            "<sitemap><loc>{}/{}</loc><lastmod>{}</lastmod></sitemap>",
            escape(state.site_url()),
            sitemap,
            lastmod
        ));
    }
    body.push_str("</sitemapindex>");

    xml(body)
}

/// GET /sitemap-static.xml
pub async fn sitemap_static(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const PAGES: &[(&str, &str, &str)] = &[
        ("/", "monthly", "0.8"),
        ("/home", "daily", "1.0"),
        ("/catalog", "daily", "0.9"),
        ("/genres", "weekly", "0.7"),
        ("/years", "yearly", "0.7"),
    ];

    let lastmod = today();
    let mut body = String::from(XML_DECL);
    body.push_str(URLSET_OPEN);
    for (path, changefreq, priority) in PAGES {
        body.push_str(&format!(
            "<url><loc>{}{}</loc><lastmod>{}</lastmod><changefreq>{}</changefreq><priority>{}</priority></url>",
            escape(state.site_url()),
            path,
            lastmod,
            changefreq,
            priority
        ));
    }
    body.push_str(URLSET_CLOSE);

    xml(body)
}

/// GET /sitemap-series.xml: streamed.
pub async fn sitemap_series(State(state): State<Arc<AppState>>) -> Response {
    let conn = state.store.conn.clone();
    let site_url = state.site_url().to_string();

    stream_urlset(move |mut tx| async move {
        let select = CatalogEntries::find()
            .select_only()
            .column(catalog_entries::Column::Slug)
            .column(catalog_entries::Column::CreatedAt)
            .order_by_asc(catalog_entries::Column::Id)
            .into_tuple::<(String, String)>();

        match select.stream(&conn).await {
            Ok(mut rows) => {
                while let Some(row) = rows.next().await {
                    match row {
                        Ok((slug, created_at)) => {
                            let element = format!(
                                "<url><loc>{}/series/{}</loc><lastmod>{}</lastmod><changefreq>weekly</changefreq><priority>0.9</priority></url>",
                                escape(&site_url),
                                escape(&slug),
                                date_of(&created_at)
                            );
                            if tx.send(Ok(Bytes::from(element))).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("Series sitemap aborted mid-stream: {}", e);
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!("Series sitemap query failed: {}", e),
        }

        let _ = tx.send(Ok(Bytes::from_static(URLSET_CLOSE.as_bytes()))).await;
    })
}

/// GET /sitemap-episodes.xml: streamed.
pub async fn sitemap_episodes(State(state): State<Arc<AppState>>) -> Response {
    let conn = state.store.conn.clone();
    let site_url = state.site_url().to_string();

    stream_urlset(move |mut tx| async move {
        let select = Episodes::find()
            .select_only()
            .column(episodes::Column::Slug)
            .column(episodes::Column::CreatedAt)
            .order_by_asc(episodes::Column::Id)
            .into_tuple::<(String, String)>();

        match select.stream(&conn).await {
            Ok(mut rows) => {
                while let Some(row) = rows.next().await {
                    match row {
                        Ok((slug, created_at)) => {
                            let element = format!(
                                "<url><loc>{}{}{}</loc><lastmod>{}</lastmod><changefreq>weekly</changefreq><priority>0.8</priority></url>",
                                escape(&site_url),
                                WATCH_PREFIX,
                                escape(&slug),
                                date_of(&created_at)
                            );
                            if tx.send(Ok(Bytes::from(element))).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("Episode sitemap aborted mid-stream: {}", e);
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!("Episode sitemap query failed: {}", e),
        }

        let _ = tx.send(Ok(Bytes::from_static(URLSET_CLOSE.as_bytes()))).await;
    })
}

/// GET /sitemap-taxonomies.xml: built from the distinct-value cache.
pub async fn sitemap_taxonomies(
    State(state): State<Arc<AppState>>,
) -> Result<Response, super::ApiError> {
    let site_url = state.site_url();

    let (genres, kinds, studios, years) = tokio::try_join!(
        state.taxonomy.distinct_values(TaxonomyField::Genres),
        state.taxonomy.distinct_values(TaxonomyField::Kind),
        state.taxonomy.distinct_values(TaxonomyField::Studio),
        state.taxonomy.release_years(),
    )?;

    let mut body = String::from(XML_DECL);
    body.push_str(URLSET_OPEN);

    let sections: [(&str, &str, &str, Vec<String>); 3] = [
        ("genre", "daily", "0.7", genres),
        ("type", "weekly", "0.7", kinds),
        ("studio", "weekly", "0.7", studios),
    ];
    for (prefix, changefreq, priority, values) in sections {
        for value in values {
            body.push_str(&format!(
                "<url><loc>{}/{}/{}</loc><changefreq>{}</changefreq><priority>{}</priority></url>",
                escape(site_url),
                prefix,
                slugify(&value),
                changefreq,
                priority
            ));
        }
    }
    for year in years {
        body.push_str(&format!(
            "<url><loc>{}/year/{}</loc><changefreq>yearly</changefreq><priority>0.6</priority></url>",
            escape(site_url),
            year
        ));
    }

    body.push_str(URLSET_CLOSE);
    Ok(xml(body))
}

// ============================================================================
// Helpers
// ============================================================================

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

/// Spawn a producer task that fills the body after the XML preamble; the
/// producer owns everything it streams from.
fn stream_urlset<F, Fut>(produce: F) -> Response
where
    F: FnOnce(mpsc::Sender<Chunk>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let (mut tx, rx) = mpsc::channel::<Chunk>(32);

    tokio::spawn(async move {
        let preamble = format!("{XML_DECL}{URLSET_OPEN}");
        if tx.send(Ok(Bytes::from(preamble))).await.is_err() {
            return;
        }
        produce(tx).await;
    });

    (
        [(header::CONTENT_TYPE, "application/xml")],
        Body::from_stream(rx),
    )
        .into_response()
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Date part of an RFC 3339 timestamp; today when the value is malformed.
fn date_of(timestamp: &str) -> String {
    timestamp
        .get(..10)
        .map_or_else(today, ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AppState;
    use crate::config::Config;
    use crate::db::Store;
    use crate::db::tests::seed_entry;
    use crate::services::TaxonomyCache;
    use axum::Router;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::util::ServiceExt;

    async fn test_state() -> Arc<AppState> {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let taxonomy = TaxonomyCache::new(store.clone(), Duration::from_secs(3600));

        Arc::new(AppState {
            config: Config::default(),
            store,
            taxonomy,
            uploader: None,
            start_time: std::time::Instant::now(),
            prometheus_handle: None,
        })
    }

    async fn body_of(app: Router, uri: &str) -> (StatusCode, String, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_robots_txt_points_at_sitemap() {
        let state = test_state().await;
        let app = Router::new()
            .route("/robots.txt", get(robots_txt))
            .with_state(state);

        let (status, content_type, body) = body_of(app, "/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, mime::TEXT_PLAIN.as_ref());
        assert!(body.contains("Sitemap: http://localhost:3000/sitemap_index.xml"));
        assert!(body.contains("Disallow: /admin/"));
    }

    #[tokio::test]
    async fn test_empty_series_sitemap_still_closes_urlset() {
        let state = test_state().await;
        let app = Router::new()
            .route("/sitemap-series.xml", get(sitemap_series))
            .with_state(state);

        let (status, content_type, body) = body_of(app, "/sitemap-series.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/xml");
        assert!(body.starts_with(XML_DECL));
        assert!(body.contains("<urlset"));
        assert!(body.ends_with(URLSET_CLOSE));
    }

    #[tokio::test]
    async fn test_series_sitemap_streams_one_url_per_entry() {
        let state = test_state().await;
        seed_entry(&state.store, "demo-anime", "Demo Anime", &[]).await;
        seed_entry(&state.store, "other-anime", "Other Anime", &[]).await;

        let app = Router::new()
            .route("/sitemap-series.xml", get(sitemap_series))
            .with_state(state);

        let (_, _, body) = body_of(app, "/sitemap-series.xml").await;
        assert!(body.contains("http://localhost:3000/series/demo-anime"));
        assert!(body.contains("http://localhost:3000/series/other-anime"));
        assert_eq!(body.matches("<url>").count(), 2);
        assert!(body.ends_with(URLSET_CLOSE));
    }

    #[tokio::test]
    async fn test_taxonomy_sitemap_uses_slugified_terms() {
        let state = test_state().await;
        seed_entry(&state.store, "demo-anime", "Demo Anime", &["Slice of Life"]).await;

        let app = Router::new()
            .route("/sitemap-taxonomies.xml", get(sitemap_taxonomies))
            .with_state(state);

        let (status, _, body) = body_of(app, "/sitemap-taxonomies.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("http://localhost:3000/genre/slice-of-life"));
        assert!(body.contains("http://localhost:3000/type/tv"));
    }
}
