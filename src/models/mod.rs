pub mod catalog;
pub mod episode;

pub use catalog::{CatalogEntry, EntryInfo, EpisodeRef};
pub use episode::{DownloadGroup, DownloadLink, EpisodeRecord, StreamLink};
