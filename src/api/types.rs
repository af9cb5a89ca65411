//! Response envelope and DTOs. Every public-facing payload is built through
//! the constructors here, which makes the URL-encoding pass a property of
//! the serialization path itself rather than something individual handlers
//! remember to do.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_IMAGE, SERIES_PREFIX, WATCH_PREFIX};
use crate::models::{CatalogEntry, EpisodeRecord};
use crate::services::listing::Page;
use crate::services::navigation::EpisodeNav;
use crate::slug::format_compact;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Encoding steps
// ============================================================================

/// Rewrite a stored image URL into an embeddable absolute form: each path
/// segment percent-encoded, relative paths absolutized against the site
/// origin. The stored value itself is never mutated.
#[must_use]
pub fn encode_image_url(raw: Option<&str>, site_url: &str) -> String {
    let raw = raw.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_IMAGE);

    let (origin, path) = split_origin(raw);
    let encoded = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    if origin.is_empty() {
        if encoded.starts_with('/') {
            format!("{site_url}{encoded}")
        } else {
            format!("{site_url}/{encoded}")
        }
    } else {
        format!("{origin}{encoded}")
    }
}

fn split_origin(url: &str) -> (&str, &str) {
    if let Some(scheme_end) = url.find("://") {
        let after_scheme = scheme_end + 3;
        match url[after_scheme..].find('/') {
            Some(i) => url.split_at(after_scheme + i),
            None => (url, ""),
        }
    } else {
        ("", url)
    }
}

/// Obfuscate a mirror URL for transport. Plain base64, reversed by the
/// client-side player; this is not encryption.
#[must_use]
pub fn obfuscate_url(url: &str) -> String {
    STANDARD.encode(url)
}

/// Year component of an RFC 3339 timestamp, for display rows.
fn year_of(timestamp: &str) -> Option<String> {
    timestamp.get(..4).map(ToString::to_string)
}

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PaginationDto {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl PaginationDto {
    #[must_use]
    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self {
            current_page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingDto<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub results: Vec<T>,
    pub pagination: PaginationDto,
}

// ============================================================================
// Catalog DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SeriesSummaryDto {
    pub slug: String,
    pub url: String,
    pub title: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    pub genres: Vec<String>,
}

impl SeriesSummaryDto {
    #[must_use]
    pub fn from_entry(entry: &CatalogEntry, site_url: &str) -> Self {
        Self {
            slug: entry.slug.clone(),
            url: format!("{SERIES_PREFIX}/{}", entry.slug),
            title: entry.title.clone(),
            image_url: encode_image_url(entry.image_url.as_deref(), site_url),
            kind: entry.info.kind.clone(),
            status: entry.info.status.clone(),
            released: entry.info.released.clone(),
            genres: entry.genres.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryInfoDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_total: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeLinkDto {
    pub title: String,
    /// Browsable URL, watch prefix + stored relative slug.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesDetailDto {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_title: Option<String>,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    pub info: EntryInfoDto,
    pub genres: Vec<String>,
    pub episodes: Vec<EpisodeLinkDto>,
    pub view_count: i64,
    pub views_label: String,
    pub created_at: String,
    pub updated_at: String,
}

impl SeriesDetailDto {
    #[must_use]
    pub fn from_entry(entry: &CatalogEntry, site_url: &str) -> Self {
        Self {
            slug: entry.slug.clone(),
            title: entry.title.clone(),
            alt_title: entry.alt_title.clone(),
            image_url: encode_image_url(entry.image_url.as_deref(), site_url),
            synopsis: entry.synopsis.clone(),
            info: EntryInfoDto {
                kind: entry.info.kind.clone(),
                status: entry.info.status.clone(),
                released: entry.info.released.clone(),
                studio: entry.info.studio.clone(),
                producers: entry.info.producers.clone(),
                episode_total: entry.info.episode_total.clone(),
            },
            genres: entry.genres.clone(),
            episodes: entry
                .episodes
                .iter()
                .map(|ep| EpisodeLinkDto {
                    title: ep.title.clone(),
                    url: format!("{WATCH_PREFIX}{}", ep.url),
                    date: ep.date.clone(),
                })
                .collect(),
            view_count: entry.view_count,
            views_label: format_compact(entry.view_count),
            created_at: entry.created_at.clone(),
            updated_at: entry.updated_at.clone(),
        }
    }
}

// ============================================================================
// Episode / watch DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LatestEpisodeDto {
    pub title: Option<String>,
    pub watch_url: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

impl LatestEpisodeDto {
    #[must_use]
    pub fn from_record(record: &EpisodeRecord, site_url: &str) -> Self {
        Self {
            title: record.title.clone(),
            watch_url: format!("{WATCH_PREFIX}{}", record.slug),
            image_url: encode_image_url(record.series_image_url.as_deref(), site_url),
            date: record.aired_label.clone(),
            year: year_of(&record.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StreamLinkDto {
    pub name: String,
    /// Base64 of the stored URL.
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadLinkDto {
    pub host: String,
    /// Base64 of the stored URL.
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadGroupDto {
    pub quality: String,
    pub links: Vec<DownloadLinkDto>,
}

#[derive(Debug, Serialize)]
pub struct SeriesRefDto {
    pub slug: String,
    pub url: String,
    pub title: Option<String>,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct WatchDto {
    pub slug: String,
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub series: SeriesRefDto,
    pub streams: Vec<StreamLinkDto>,
    pub downloads: Vec<DownloadGroupDto>,
    pub nav: EpisodeNav,
}

impl WatchDto {
    /// The single construction path for watch payloads; mirror obfuscation
    /// happens here and nowhere else.
    #[must_use]
    pub fn from_record(record: &EpisodeRecord, nav: EpisodeNav, site_url: &str) -> Self {
        Self {
            slug: record.slug.clone(),
            title: record.title.clone(),
            thumbnail_url: record
                .thumbnail_url
                .as_deref()
                .map(|url| encode_image_url(Some(url), site_url)),
            series: SeriesRefDto {
                slug: record.series_slug.clone(),
                url: format!("{SERIES_PREFIX}/{}", record.series_slug),
                title: record.series_title.clone(),
                image_url: encode_image_url(record.series_image_url.as_deref(), site_url),
            },
            streams: record
                .streams
                .iter()
                .map(|s| StreamLinkDto {
                    name: s.name.clone(),
                    url: obfuscate_url(&s.url),
                })
                .collect(),
            downloads: record
                .downloads
                .iter()
                .map(|group| DownloadGroupDto {
                    quality: group.quality.clone(),
                    links: group
                        .links
                        .iter()
                        .map(|l| DownloadLinkDto {
                            host: l.host.clone(),
                            url: obfuscate_url(&l.url),
                        })
                        .collect(),
                })
                .collect(),
            nav,
        }
    }
}

// ============================================================================
// Misc DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ReportDto {
    pub id: i32,
    pub page_url: String,
    pub message: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    const SITE: &str = "http://localhost:3000";

    #[test]
    fn test_encode_image_url_absolutizes_relative_paths() {
        assert_eq!(
            encode_image_url(Some("/images/cover.jpg"), SITE),
            "http://localhost:3000/images/cover.jpg"
        );
    }

    #[test]
    fn test_encode_image_url_percent_encodes_segments() {
        assert_eq!(
            encode_image_url(Some("/images/my cover (1).jpg"), SITE),
            "http://localhost:3000/images/my%20cover%20%281%29.jpg"
        );
    }

    #[test]
    fn test_encode_image_url_keeps_remote_origin() {
        assert_eq!(
            encode_image_url(Some("https://cdn.example.com/covers/a b.png"), SITE),
            "https://cdn.example.com/covers/a%20b.png"
        );
    }

    #[test]
    fn test_encode_image_url_falls_back_to_default() {
        assert_eq!(
            encode_image_url(None, SITE),
            "http://localhost:3000/images/default.jpg"
        );
        assert_eq!(
            encode_image_url(Some(""), SITE),
            "http://localhost:3000/images/default.jpg"
        );
    }

    #[test]
    fn test_obfuscated_url_round_trips() {
        let original = "https://mirror.example/e/abc123?token=x&y=1";
        let encoded = obfuscate_url(original);
        assert_ne!(encoded, original);

        let decoded = STANDARD.decode(&encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), original);
    }
}
