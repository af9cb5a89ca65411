/// Browsable episode pages live under this prefix; stored episode slugs are
/// relative (`/<series>/<number>`).
pub const WATCH_PREFIX: &str = "/watch";

pub const SERIES_PREFIX: &str = "/series";

pub const DEFAULT_IMAGE: &str = "/images/default.jpg";

pub mod pagination {

    pub const ITEMS_PER_PAGE: u64 = 20;

    pub const API_LISTING: u64 = 24;

    pub const ADMIN_LISTING: u64 = 30;

    pub const LATEST_SERIES_RAIL: u64 = 8;

    pub const POPULAR_LIMIT: u64 = 10;

    pub const HIGHLIGHT_LIMIT: u64 = 6;

    pub const RECOMMENDATION_LIMIT: u64 = 7;
}

pub mod sessions {

    pub const USER_ID_KEY: &str = "user_id";

    pub const USERNAME_KEY: &str = "username";

    pub const ADMIN_KEY: &str = "admin";

    pub const TTL_DAYS: i64 = 14;
}

pub mod mirrors {

    /// Stream mirror names produced by the remote-upload pipeline; the bulk
    /// clear operation removes exactly these.
    pub const STREAM_NAMES: &[&str] = &["Mirror", "Viplay", "EarnVids"];

    pub const DOWNLOAD_QUALITIES: &[&str] = &["Mirror", "Viplay", "EarnVids", "480p", "720p"];
}
