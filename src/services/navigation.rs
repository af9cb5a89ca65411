//! Previous/next resolution for watch pages, driven by the parent entry's
//! embedded ordered episode list.

use serde::Serialize;

use crate::constants::{SERIES_PREFIX, WATCH_PREFIX};
use crate::models::CatalogEntry;

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,

    /// Browsable URL (watch prefix + stored relative slug).
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodeNav {
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,

    /// Link to the parent series page.
    pub all: Option<String>,
}

/// Resolve navigation for `episode_slug`. A missing parent, or a slug the
/// parent's list does not contain, degrades to all-null navigation; the
/// episode itself still renders.
#[must_use]
pub fn resolve(parent: Option<&CatalogEntry>, episode_slug: &str) -> EpisodeNav {
    let Some(parent) = parent else {
        return EpisodeNav::default();
    };

    let mut nav = EpisodeNav {
        all: Some(format!("{SERIES_PREFIX}/{}", parent.slug)),
        ..EpisodeNav::default()
    };

    let Some(position) = parent.episode_position(episode_slug) else {
        return nav;
    };

    if position > 0 {
        nav.prev = parent.episodes.get(position - 1).map(to_link);
    }
    if position + 1 < parent.episodes.len() {
        nav.next = parent.episodes.get(position + 1).map(to_link);
    }

    nav
}

fn to_link(episode: &crate::models::EpisodeRef) -> NavLink {
    NavLink {
        title: episode.title.clone(),
        url: format!("{WATCH_PREFIX}{}", episode.url),
        date: episode.date.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryInfo, EpisodeRef};

    fn entry_with_episodes(count: usize) -> CatalogEntry {
        CatalogEntry {
            id: 1,
            slug: "demo-anime".to_string(),
            title: "Demo Anime".to_string(),
            alt_title: None,
            image_url: None,
            synopsis: None,
            info: EntryInfo::default(),
            genres: vec![],
            episodes: (1..=count)
                .map(|n| EpisodeRef {
                    title: format!("Episode {n}"),
                    url: format!("/demo-anime/{n}"),
                    date: None,
                })
                .collect(),
            view_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_first_episode_has_no_prev() {
        let entry = entry_with_episodes(3);
        let nav = resolve(Some(&entry), "/demo-anime/1");

        assert!(nav.prev.is_none());
        assert_eq!(nav.next.unwrap().url, "/watch/demo-anime/2");
        assert_eq!(nav.all.as_deref(), Some("/series/demo-anime"));
    }

    #[test]
    fn test_last_episode_has_no_next() {
        let entry = entry_with_episodes(3);
        let nav = resolve(Some(&entry), "/demo-anime/3");

        assert_eq!(nav.prev.unwrap().url, "/watch/demo-anime/2");
        assert!(nav.next.is_none());
    }

    #[test]
    fn test_middle_episode_has_both_neighbors() {
        let entry = entry_with_episodes(3);
        let nav = resolve(Some(&entry), "/demo-anime/2");

        assert_eq!(nav.prev.unwrap().url, "/watch/demo-anime/1");
        assert_eq!(nav.next.unwrap().url, "/watch/demo-anime/3");
    }

    #[test]
    fn test_missing_parent_degrades_to_null_navigation() {
        let nav = resolve(None, "/demo-anime/1");
        assert!(nav.prev.is_none());
        assert!(nav.next.is_none());
        assert!(nav.all.is_none());
    }

    #[test]
    fn test_unlisted_slug_keeps_series_link_only() {
        let entry = entry_with_episodes(2);
        let nav = resolve(Some(&entry), "/demo-anime/99");

        assert!(nav.prev.is_none());
        assert!(nav.next.is_none());
        assert_eq!(nav.all.as_deref(), Some("/series/demo-anime"));
    }

    #[test]
    fn test_single_episode_has_neither_neighbor() {
        let entry = entry_with_episodes(1);
        let nav = resolve(Some(&entry), "/demo-anime/1");
        assert!(nav.prev.is_none());
        assert!(nav.next.is_none());
    }
}
