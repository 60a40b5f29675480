//! Provider traits used by the discovery loop, and their implementations
//! over the catalog clients.

use async_trait::async_trait;
use core_metadata::providers::{
    BandcampSearch, CatalogAlbum, LastFmAlbumMatch, LastFmClient, SpotifyArtist, SpotifyClient,
    StoreLink,
};
use core_metadata::Result as MetadataResult;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

/// The stored album a discovery starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAlbum {
    pub id: Option<String>,
    pub artist: String,
    pub album_name: String,
    pub url: Option<String>,
}

impl SeedAlbum {
    pub fn new(artist: impl Into<String>, album_name: impl Into<String>) -> Self {
        Self {
            id: None,
            artist: artist.into(),
            album_name: album_name.into(),
            url: None,
        }
    }
}

/// Artist catalog with related artists and releases (Spotify).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn search_artists(&self, query: &str, limit: u32) -> MetadataResult<Vec<SpotifyArtist>>;

    async fn related_artists(&self, artist_id: &str) -> MetadataResult<Vec<SpotifyArtist>>;

    async fn artist_albums(&self, artist_id: &str) -> MetadataResult<Vec<CatalogAlbum>>;
}

/// Community tags and similar artists (Last.fm).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TagProvider: Send + Sync {
    async fn similar_artists(&self, artist: &str, limit: u32) -> MetadataResult<Vec<String>>;

    async fn artist_tags(&self, artist: &str, limit: usize) -> MetadataResult<Vec<String>>;

    async fn album_tags(&self, artist: &str, album: &str, limit: usize) -> MetadataResult<Vec<String>>;

    /// Best album match; `artist` may be empty.
    async fn search_album(&self, album: &str, artist: &str) -> MetadataResult<Option<LastFmAlbumMatch>>;
}

/// Finds a store page for a release (Bandcamp).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreLinkProvider: Send + Sync {
    async fn find_album(&self, artist: &str, album: &str) -> MetadataResult<Option<StoreLink>>;
}

/// Picks the seed album when the caller does not supply one.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn random_seed(&self) -> crate::Result<Option<SeedAlbum>>;
}

#[async_trait]
impl CatalogProvider for SpotifyClient {
    async fn search_artists(&self, query: &str, limit: u32) -> MetadataResult<Vec<SpotifyArtist>> {
        SpotifyClient::search_artists(self, query, limit).await
    }

    async fn related_artists(&self, artist_id: &str) -> MetadataResult<Vec<SpotifyArtist>> {
        SpotifyClient::related_artists(self, artist_id).await
    }

    async fn artist_albums(&self, artist_id: &str) -> MetadataResult<Vec<CatalogAlbum>> {
        SpotifyClient::artist_albums(self, artist_id).await
    }
}

#[async_trait]
impl TagProvider for LastFmClient {
    async fn similar_artists(&self, artist: &str, limit: u32) -> MetadataResult<Vec<String>> {
        LastFmClient::similar_artists(self, artist, limit).await
    }

    async fn artist_tags(&self, artist: &str, limit: usize) -> MetadataResult<Vec<String>> {
        self.artist_top_tags(artist, limit).await
    }

    async fn album_tags(&self, artist: &str, album: &str, limit: usize) -> MetadataResult<Vec<String>> {
        self.album_top_tags(artist, album, limit).await
    }

    async fn search_album(&self, album: &str, artist: &str) -> MetadataResult<Option<LastFmAlbumMatch>> {
        LastFmClient::search_album(self, album, Some(artist)).await
    }
}

#[async_trait]
impl StoreLinkProvider for BandcampSearch {
    async fn find_album(&self, artist: &str, album: &str) -> MetadataResult<Option<StoreLink>> {
        self.search(artist, album).await
    }
}
