//! 301 redirects from the old URL scheme (path-segment pagination and the
//! old watch prefix) to the canonical routes.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::constants::WATCH_PREFIX;

pub fn router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new()
        .route("/series-list/page/{page}", get(catalog_page))
        .route("/genre/{slug}/page/{page}", get(genre_page))
        .route("/status/{slug}/page/{page}", get(status_page))
        .route("/type/{slug}/page/{page}", get(kind_page))
        .route("/studio/{slug}/page/{page}", get(studio_page))
        .route("/year/{year}/page/{page}", get(year_page))
        .route("/page/{page}", get(home_page))
        .route("/nonton/{series}/{number}", get(legacy_watch))
}

fn moved(to: String) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, to)]).into_response()
}

/// `/<base>/page/7` becomes `/<base>?page=7`; a non-numeric page component
/// redirects to the bare base path.
fn paged(base: &str, raw_page: &str) -> Response {
    if !raw_page.is_empty() && raw_page.chars().all(|c| c.is_ascii_digit()) {
        moved(format!("{base}?page={raw_page}"))
    } else {
        moved(base.to_string())
    }
}

async fn catalog_page(Path(page): Path<String>) -> Response {
    paged("/catalog", &page)
}

async fn home_page(Path(page): Path<String>) -> Response {
    paged("/home", &page)
}

async fn genre_page(Path((slug, page)): Path<(String, String)>) -> Response {
    paged(&format!("/genre/{slug}"), &page)
}

async fn status_page(Path((slug, page)): Path<(String, String)>) -> Response {
    paged(&format!("/status/{slug}"), &page)
}

async fn kind_page(Path((slug, page)): Path<(String, String)>) -> Response {
    paged(&format!("/type/{slug}"), &page)
}

async fn studio_page(Path((slug, page)): Path<(String, String)>) -> Response {
    paged(&format!("/studio/{slug}"), &page)
}

async fn year_page(Path((year, page)): Path<(String, String)>) -> Response {
    paged(&format!("/year/{year}"), &page)
}

async fn legacy_watch(Path((series, number)): Path<(String, String)>) -> Response {
    moved(format!("{WATCH_PREFIX}/{series}/{number}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    async fn location_of(uri: &str) -> (StatusCode, String) {
        let app: Router = router();
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        (status, location)
    }

    #[tokio::test]
    async fn test_numeric_page_becomes_query_string() {
        let (status, location) = location_of("/genre/action/page/3").await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location, "/genre/action?page=3");
    }

    #[tokio::test]
    async fn test_non_numeric_page_redirects_to_base() {
        let (_, location) = location_of("/series-list/page/abc").await;
        assert_eq!(location, "/catalog");
    }

    #[tokio::test]
    async fn test_legacy_watch_prefix() {
        let (status, location) = location_of("/nonton/demo-anime/2").await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location, "/watch/demo-anime/2");
    }
}
