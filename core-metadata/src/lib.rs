//! # Metadata Module
//!
//! Turns posted links into album metadata and talks to the music catalogs
//! used by random discovery.
//!
//! ## Overview
//!
//! This module handles:
//! - Platform detection from URLs
//! - Page scraping (Open Graph, Twitter cards, Bandcamp page data)
//! - Bandcamp header rotation when a page refuses the first request
//! - Spotify, Last.fm and Bandcamp search clients

pub mod bandcamp;
pub mod error;
pub mod extractor;
pub mod platform;
pub mod providers;
mod rate_limit;

pub use bandcamp::parse_bandcamp;
pub use error::{MetadataError, Result};
pub use extractor::{parse_generic, ExtractedMetadata, MetadataExtractor, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
pub use platform::{detect_platform, HeaderProfile, Platform};
pub use providers::{
    BandcampSearch, CatalogAlbum, LastFmAlbumMatch, LastFmClient, SpotifyArtist, SpotifyClient,
    StoreLink,
};
