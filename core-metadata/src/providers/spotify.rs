//! Spotify Web API Client
//!
//! Used by random discovery to walk from a seed artist to related artists
//! and their releases.
//!
//! ## API Endpoints
//!
//! - **Token**: `POST https://accounts.spotify.com/api/token` (client credentials)
//! - **Search**: `GET /v1/search?q={query}&type=artist&limit={n}`
//! - **Artist**: `GET /v1/artists/{id}`
//! - **Related artists**: `GET /v1/artists/{id}/related-artists`
//! - **Artist albums**: `GET /v1/artists/{id}/albums?include_groups=album,single`
//!
//! ## Authentication
//!
//! The client-credentials token is cached until shortly before it expires
//! and refreshed transparently. A 401 drops the cached token.

use crate::error::{MetadataError, Result};
use crate::providers::ensure_success;
use crate::rate_limit::RateLimiter;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpRequest};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Refresh the token this long before Spotify says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Upper bound Spotify accepts for `limit` parameters.
const MAX_PAGE_SIZE: u32 = 50;

/// An artist as returned by search or lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: u32,
    pub url: Option<String>,
}

/// A release picked from an artist's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAlbum {
    pub id: String,
    /// Primary credited artist of the release.
    pub artist: String,
    pub artist_id: String,
    pub album: String,
    pub url: String,
    pub image: Option<String>,
    pub release_date: Option<String>,
    pub album_type: String,
    pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    popularity: u32,
    #[serde(default)]
    external_urls: ExternalUrls,
}

impl From<ArtistObject> for SpotifyArtist {
    fn from(artist: ArtistObject) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
            popularity: artist.popularity,
            url: artist.external_urls.spotify,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Paging<ArtistObject>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RelatedArtistsResponse {
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
struct SimplifiedArtist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    id: String,
    name: String,
    #[serde(default)]
    album_type: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    images: Vec<Image>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: Arc<dyn HttpClient>,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl SpotifyClient {
    /// Client-credentials app; no token is requested until the first call.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        client_id: String,
        client_secret: String,
        rate_limit_delay_ms: u64,
    ) -> Self {
        Self {
            http_client,
            client_id,
            client_secret,
            token: Mutex::new(None),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(rate_limit_delay_ms))),
        }
    }

    /// Search artists by name. `query` is passed through verbatim, so field
    /// filters like `artist:"Name"` work.
    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Vec<SpotifyArtist>> {
        let path = format!(
            "/search?q={}&type=artist&limit={}",
            urlencoding::encode(query),
            limit.clamp(1, MAX_PAGE_SIZE)
        );

        let response: Option<SearchResponse> = self.get_json(&path).await?;
        Ok(response
            .map(|r| r.artists.items.into_iter().map(SpotifyArtist::from).collect())
            .unwrap_or_default())
    }

    /// Look up an artist by id.
    pub async fn artist(&self, id: &str) -> Result<Option<SpotifyArtist>> {
        let path = format!("/artists/{}", urlencoding::encode(id));
        let artist: Option<ArtistObject> = self.get_json(&path).await?;
        Ok(artist.map(SpotifyArtist::from))
    }

    /// Artists Spotify considers similar to the given one.
    pub async fn related_artists(&self, id: &str) -> Result<Vec<SpotifyArtist>> {
        let path = format!("/artists/{}/related-artists", urlencoding::encode(id));
        let response: Option<RelatedArtistsResponse> = self.get_json(&path).await?;
        Ok(response
            .map(|r| r.artists.into_iter().map(SpotifyArtist::from).collect())
            .unwrap_or_default())
    }

    /// Albums and singles by an artist. Genres are left empty.
    pub async fn artist_albums(&self, id: &str) -> Result<Vec<CatalogAlbum>> {
        let path = format!(
            "/artists/{}/albums?include_groups=album,single&limit={}",
            urlencoding::encode(id),
            MAX_PAGE_SIZE
        );
        let response: Option<Paging<AlbumObject>> = self.get_json(&path).await?;

        Ok(response
            .map(|page| {
                page.items
                    .into_iter()
                    .map(|album| to_catalog_album(album, id))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        debug!("Requesting Spotify access token");
        let credentials = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let request = HttpRequest::post(SPOTIFY_TOKEN_URL)
            .basic_auth(credentials)
            .form("grant_type=client_credentials")
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Spotify token request failed: {}", e)))?;

        if matches!(response.status, 400 | 401 | 403) {
            return Err(MetadataError::Auth(format!(
                "Spotify rejected client credentials (HTTP {})",
                response.status
            )));
        }
        ensure_success("Spotify", &response)?;

        let token: TokenResponse = serde_json::from_slice(&response.body).map_err(|e| {
            MetadataError::JsonParse(format!("Failed to parse Spotify token: {}", e))
        })?;

        let value = token.access_token.clone();
        *cached = Some(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    /// GET an API path. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let token = self.access_token().await?;

        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = HttpRequest::get(format!("{}{}", SPOTIFY_API_BASE, path))
            .bearer_token(token)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Spotify request failed: {}", e)))?;

        match response.status {
            404 => {
                debug!(path = %path, "Spotify resource not found");
                return Ok(None);
            }
            401 => {
                warn!("Spotify access token rejected, dropping cached token");
                self.token.lock().await.take();
                return Err(MetadataError::Auth(
                    "Spotify rejected the access token".to_string(),
                ));
            }
            _ => ensure_success("Spotify", &response)?,
        }

        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| MetadataError::JsonParse(format!("Failed to parse Spotify response: {}", e)))
    }
}

fn to_catalog_album(album: AlbumObject, requested_artist_id: &str) -> CatalogAlbum {
    let (artist_id, artist) = album
        .artists
        .into_iter()
        .next()
        .map(|a| (a.id, a.name))
        .unwrap_or_else(|| (requested_artist_id.to_string(), String::new()));

    CatalogAlbum {
        url: album
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/album/{}", album.id)),
        id: album.id,
        artist,
        artist_id,
        album: album.name,
        image: album.images.into_iter().next().map(|i| i.url),
        release_date: album.release_date,
        album_type: album.album_type,
        genres: Vec::new(),
    }
}

/// Choose one release uniformly at random.
pub fn pick_album<'a, R: Rng + ?Sized>(
    albums: &'a [CatalogAlbum],
    rng: &mut R,
) -> Option<&'a CatalogAlbum> {
    albums.choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn album(id: &str) -> CatalogAlbum {
        CatalogAlbum {
            id: id.to_string(),
            artist: "Gorguts".to_string(),
            artist_id: "a1".to_string(),
            album: format!("Album {}", id),
            url: format!("https://open.spotify.com/album/{}", id),
            image: None,
            release_date: None,
            album_type: "album".to_string(),
            genres: Vec::new(),
        }
    }

    #[test]
    fn test_pick_album_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_album(&[], &mut rng).is_none());
    }

    #[test]
    fn test_pick_album_is_member() {
        let albums = vec![album("x"), album("y"), album("z")];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let picked = pick_album(&albums, &mut rng).unwrap();
            assert!(albums.contains(picked));
        }
    }

    #[test]
    fn test_catalog_album_uses_primary_artist() {
        let raw: AlbumObject = serde_json::from_str(
            r#"{"id": "al1", "name": "Obscura", "album_type": "album",
                "release_date": "1998-06-01",
                "artists": [{"id": "g1", "name": "Gorguts"}, {"id": "x", "name": "Guest"}],
                "images": [{"url": "https://i.scdn.co/image/big"}, {"url": "https://i.scdn.co/image/small"}],
                "external_urls": {"spotify": "https://open.spotify.com/album/al1"}}"#,
        )
        .unwrap();

        let album = to_catalog_album(raw, "requested");
        assert_eq!(album.artist, "Gorguts");
        assert_eq!(album.artist_id, "g1");
        assert_eq!(album.album, "Obscura");
        assert_eq!(album.image.as_deref(), Some("https://i.scdn.co/image/big"));
        assert_eq!(album.url, "https://open.spotify.com/album/al1");
    }

    #[test]
    fn test_catalog_album_without_artists_or_url() {
        let raw: AlbumObject = serde_json::from_str(r#"{"id": "al2", "name": "Demo"}"#).unwrap();

        let album = to_catalog_album(raw, "requested");
        assert_eq!(album.artist_id, "requested");
        assert_eq!(album.artist, "");
        assert_eq!(album.url, "https://open.spotify.com/album/al2");
    }

    #[test]
    fn test_token_freshness() {
        let fresh = AccessToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_fresh());

        let stale = AccessToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!stale.is_fresh());
    }
}
