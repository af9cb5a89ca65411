//! Detached view-count increments. The response never waits on the write;
//! failures are logged and dropped.

use tracing::warn;

use crate::db::Store;

pub fn record_view(store: &Store, slug: &str) {
    let store = store.clone();
    let slug = slug.to_string();

    tokio::spawn(async move {
        if let Err(e) = store.increment_view_count(&slug).await {
            warn!("Failed to increment view count for {}: {}", slug, e);
        } else {
            metrics::counter!("catalog_detail_views_total").increment(1);
        }
    });
}
