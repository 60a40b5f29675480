//! SQLite-backed stores for the wall.
//!
//! One trait per table family, each with a `Sqlite*` implementation over a
//! shared pool: albums with their likes, concerts with theirs, and the
//! per-user discovery history. Listings that can grow use [`Page`].

pub mod album;
pub mod concert;
pub mod discovery;
pub mod pagination;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use concert::{ConcertRepository, SqliteConcertRepository};
pub use discovery::{DiscoveryRepository, SqliteDiscoveryRepository};
pub use pagination::{Page, PageRequest};

/// Normalize a tag filter the same way stored tags are normalized.
pub(crate) fn normalize_filter(tag: Option<&str>) -> Option<String> {
    tag.map(|t| t.trim().trim_start_matches('#').to_lowercase())
        .filter(|t| !t.is_empty())
}
