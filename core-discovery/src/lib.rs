//! Random discovery for the Metal Wall
//!
//! Starting from an album already on the wall, finds a release by a
//! related artist, checks that it really is by that artist and that it is
//! metal, and returns it with tags and an optional Bandcamp link.
//!
//! The catalog clients are reached through the traits in [`seams`], so the
//! loop can be driven by any catalog, tag source, or store search.

pub mod error;
pub mod genre;
pub mod normalize;
pub mod seams;
pub mod service;

pub use error::{DiscoveryError, Result};
pub use genre::{classify, is_metal, GenreVerdict};
pub use normalize::{clean_artist_name, normalize_artist_name, IdentityMatch};
pub use seams::{CatalogProvider, SeedAlbum, SeedSource, StoreLinkProvider, TagProvider};
pub use service::{
    DiscoveryOutcome, DiscoveryService, DiscoverySettings, Validation, DISCOVERY_TAG,
    MAX_DISCOVERY_TAGS,
};
