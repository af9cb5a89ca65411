//! Distinct-value cache over the taxonomy fields used for faceted browsing.
//!
//! Lists are populated lazily on first miss and kept for a fixed TTL.
//! Catalog writes do not evict: a new taxonomy value stays invisible to slug
//! resolution until the entry expires. Concurrent misses may each recompute
//! the same list; the query is read-only and idempotent, so the race only
//! costs redundant work.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use regex::Regex;
use tokio::sync::RwLock;

use crate::db::Store;
use crate::slug::slugify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyField {
    Genres,
    Status,
    Kind,
    Studio,
    Released,
}

impl TaxonomyField {
    pub const ALL: [Self; 5] = [
        Self::Genres,
        Self::Status,
        Self::Kind,
        Self::Studio,
        Self::Released,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Genres => "genres",
            Self::Status => "status",
            Self::Kind => "kind",
            Self::Studio => "studio",
            Self::Released => "released",
        }
    }
}

struct CachedList {
    values: Vec<String>,
    expires_at: Instant,
}

/// Injected on `AppState`; never a process global.
pub struct TaxonomyCache {
    store: Store,
    ttl: Duration,
    entries: RwLock<HashMap<TaxonomyField, CachedList>>,
}

impl TaxonomyCache {
    #[must_use]
    pub fn new(store: Store, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// All distinct values of `field`, cached for the configured TTL.
    pub async fn distinct_values(&self, field: TaxonomyField) -> Result<Vec<String>> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&field)
                && cached.expires_at > Instant::now()
            {
                return Ok(cached.values.clone());
            }
        }

        tracing::debug!("taxonomy cache miss: {}", field.as_str());
        let values = self.store.distinct_taxonomy_values(field).await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            field,
            CachedList {
                values: values.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(values)
    }

    /// Resolve a browse slug back to the first stored value that slugifies
    /// to it. Colliding values resolve in store order, which is undefined.
    pub async fn resolve_slug(
        &self,
        field: TaxonomyField,
        candidate: &str,
    ) -> Result<Option<String>> {
        let values = self.distinct_values(field).await?;
        Ok(values.into_iter().find(|v| slugify(v) == candidate))
    }

    /// Distinct 4-digit years mentioned in release strings, newest first.
    pub async fn release_years(&self) -> Result<Vec<String>> {
        let released = self.distinct_values(TaxonomyField::Released).await?;
        Ok(extract_years(&released))
    }
}

fn extract_years(release_strings: &[String]) -> Vec<String> {
    // Constant pattern, cannot fail to compile.
    let year_re = Regex::new(r"(\d{4})").unwrap();

    let mut years: Vec<String> = release_strings
        .iter()
        .filter_map(|s| year_re.find(s).map(|m| m.as_str().to_string()))
        .collect();

    years.sort_unstable();
    years.dedup();
    years.reverse();
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::db::tests::seed_entry;

    #[test]
    fn test_extract_years() {
        let input = vec![
            "Apr 2021".to_string(),
            "2021".to_string(),
            "Fall 2019".to_string(),
            "TBA".to_string(),
            "Jan 3, 2023".to_string(),
        ];
        assert_eq!(extract_years(&input), vec!["2023", "2021", "2019"]);
    }

    #[tokio::test]
    async fn test_cached_list_survives_writes_within_ttl() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "first", "First", &["Action"]).await;

        let cache = TaxonomyCache::new(store.clone(), Duration::from_secs(3600));
        let before = cache.distinct_values(TaxonomyField::Genres).await.unwrap();
        assert_eq!(before, vec!["Action"]);

        // A write after population is invisible until the TTL elapses.
        seed_entry(&store, "second", "Second", &["Romance"]).await;
        let after = cache.distinct_values(TaxonomyField::Genres).await.unwrap();
        assert_eq!(after, vec!["Action"]);
    }

    #[tokio::test]
    async fn test_expired_list_is_recomputed() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "first", "First", &["Action"]).await;

        let cache = TaxonomyCache::new(store.clone(), Duration::from_secs(0));
        assert_eq!(
            cache.distinct_values(TaxonomyField::Genres).await.unwrap(),
            vec!["Action"]
        );

        seed_entry(&store, "second", "Second", &["Romance"]).await;
        let recomputed = cache.distinct_values(TaxonomyField::Genres).await.unwrap();
        assert!(recomputed.contains(&"Romance".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_slug_matches_slugified_value() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        seed_entry(&store, "first", "First", &["Slice of Life"]).await;

        let cache = TaxonomyCache::new(store, Duration::from_secs(3600));
        let resolved = cache
            .resolve_slug(TaxonomyField::Genres, "slice-of-life")
            .await
            .unwrap();
        assert_eq!(resolved.as_deref(), Some("Slice of Life"));

        let missing = cache
            .resolve_slug(TaxonomyField::Genres, "does-not-exist")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
