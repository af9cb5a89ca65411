//! Shared pagination pipeline: clamp the requested page, run count and
//! offset/limit fetch concurrently, report ceil-divided page totals.
//!
//! Count and fetch share the same filter but no transaction; under
//! concurrent writes they may disagree, which is accepted.

use anyhow::Result;
use sea_orm::{
    DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QuerySelect, Select,
};
use serde::Deserialize;

/// Query-string pagination input. The raw value is kept as a string so a
/// non-numeric `?page=` falls back to page 1 instead of rejecting the
/// request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn page(&self) -> u64 {
        clamp_page(self.page.as_deref())
    }
}

/// Absent, non-numeric and non-positive inputs all collapse to page 1.
#[must_use]
pub fn clamp_page(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Run `select` as one page: a COUNT over the filter and the
/// offset/limit fetch execute concurrently.
pub async fn paginate<E>(
    conn: &DatabaseConnection,
    select: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
{
    debug_assert!(per_page > 0);

    let page = page.max(1);
    let skip = (page - 1) * per_page;

    let (total_items, items) = tokio::try_join!(
        select.clone().count(conn),
        select.offset(skip).limit(per_page).all(conn),
    )?;

    Ok(Page {
        items,
        page,
        per_page,
        total_items,
        total_pages: total_items.div_ceil(per_page),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some("")), 1);
        assert_eq!(clamp_page(Some("abc")), 1);
        assert_eq!(clamp_page(Some("0")), 1);
        assert_eq!(clamp_page(Some("-3")), 1);
        assert_eq!(clamp_page(Some("1")), 1);
        assert_eq!(clamp_page(Some(" 7 ")), 7);
    }

    #[test]
    fn test_page_query_skip_arithmetic() {
        let query = PageQuery {
            page: Some("3".to_string()),
        };
        let per_page = 20;
        assert_eq!((query.page() - 1) * per_page, 40);
    }

    #[test]
    fn test_page_map_keeps_totals() {
        let page = Page {
            items: vec![1, 2, 3],
            page: 2,
            per_page: 3,
            total_items: 7,
            total_pages: 3,
        };
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.total_pages, 3);
        assert_eq!(mapped.total_items, 7);
    }

    #[test]
    fn test_total_pages_is_ceil() {
        assert_eq!(0u64.div_ceil(20), 0);
        assert_eq!(1u64.div_ceil(20), 1);
        assert_eq!(20u64.div_ceil(20), 1);
        assert_eq!(21u64.div_ceil(20), 2);
    }
}
