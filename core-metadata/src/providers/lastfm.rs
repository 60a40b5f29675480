//! Last.fm API Client
//!
//! Provides similar artists and community tags used to validate discovered
//! releases.
//!
//! ## API Endpoints
//!
//! All calls go to `https://ws.audioscrobbler.com/2.0/?method={method}&api_key={key}&format=json`:
//!
//! - `artist.getsimilar`
//! - `artist.gettoptags`
//! - `album.gettoptags`
//! - `album.search`
//!
//! ## Errors
//!
//! Last.fm reports failures in the body. Error 6 ("not found") becomes an
//! empty result; any other code is a [`MetadataError::RemoteApi`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::providers::LastFmClient;
//!
//! let client = LastFmClient::new(http_client, "your_api_key".to_string(), 250);
//! let tags = client.artist_top_tags("Emperor", 10).await?;
//! ```

use crate::error::{MetadataError, Result};
use crate::providers::{ensure_success, OneOrMany};
use crate::rate_limit::RateLimiter;
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Last.fm API base URL
const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";

/// Timeout for API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Last.fm error code for unknown artists and albums.
const ERROR_NOT_FOUND: i32 = 6;

/// Best `album.search` hit: the corrected artist and album names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastFmAlbumMatch {
    pub artist: String,
    pub album: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SimilarArtistsResponse {
    similarartists: SimilarArtists,
}

#[derive(Debug, Deserialize)]
struct SimilarArtists {
    #[serde(default)]
    artist: OneOrMany<Named>,
}

#[derive(Debug, Deserialize)]
struct TopTagsResponse {
    toptags: TopTags,
}

#[derive(Debug, Deserialize)]
struct TopTags {
    #[serde(default)]
    tag: OneOrMany<Named>,
}

#[derive(Debug, Deserialize)]
struct AlbumSearchResponse {
    results: AlbumSearchResults,
}

#[derive(Debug, Deserialize)]
struct AlbumSearchResults {
    albummatches: AlbumMatches,
}

#[derive(Debug, Deserialize)]
struct AlbumMatches {
    #[serde(default)]
    album: OneOrMany<AlbumMatch>,
}

#[derive(Debug, Deserialize)]
struct AlbumMatch {
    name: String,
    artist: String,
    url: Option<String>,
}

/// Last.fm error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: i32,
    message: String,
}

/// Last.fm API client
///
/// Implements automatic rate limiting to be respectful to the API.
pub struct LastFmClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl LastFmClient {
    /// Creates a new Last.fm API client
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `api_key` - Last.fm API key
    /// * `rate_limit_delay_ms` - Minimum delay between requests in milliseconds
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: String, rate_limit_delay_ms: u64) -> Self {
        Self {
            http_client,
            api_key,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(rate_limit_delay_ms))),
        }
    }

    /// Names of artists similar to `artist`, best match first.
    pub async fn similar_artists(&self, artist: &str, limit: u32) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let response: Option<SimilarArtistsResponse> = self
            .call(
                "artist.getsimilar",
                &[("artist", artist), ("limit", &limit), ("autocorrect", "1")],
            )
            .await?;

        Ok(response
            .map(|r| names(r.similarartists.artist))
            .unwrap_or_default())
    }

    /// Lowercased top tags of an artist.
    pub async fn artist_top_tags(&self, artist: &str, limit: usize) -> Result<Vec<String>> {
        let response: Option<TopTagsResponse> = self
            .call("artist.gettoptags", &[("artist", artist), ("autocorrect", "1")])
            .await?;

        Ok(response
            .map(|r| tag_names(r.toptags.tag, limit))
            .unwrap_or_default())
    }

    /// Lowercased top tags of an album.
    pub async fn album_top_tags(&self, artist: &str, album: &str, limit: usize) -> Result<Vec<String>> {
        let response: Option<TopTagsResponse> = self
            .call(
                "album.gettoptags",
                &[("artist", artist), ("album", album), ("autocorrect", "1")],
            )
            .await?;

        Ok(response
            .map(|r| tag_names(r.toptags.tag, limit))
            .unwrap_or_default())
    }

    /// Find an album, optionally narrowing by artist. Falls back to an
    /// album-only search when the narrowed one finds nothing.
    pub async fn search_album(&self, album: &str, artist: Option<&str>) -> Result<Option<LastFmAlbumMatch>> {
        if let Some(artist) = artist.filter(|a| !a.trim().is_empty()) {
            let query = format!("{} {}", album, artist);
            if let Some(found) = self.search_album_query(&query).await? {
                return Ok(Some(found));
            }
        }
        self.search_album_query(album).await
    }

    async fn search_album_query(&self, query: &str) -> Result<Option<LastFmAlbumMatch>> {
        let response: Option<AlbumSearchResponse> = self
            .call("album.search", &[("album", query), ("limit", "5")])
            .await?;

        Ok(response.and_then(|r| {
            r.results
                .albummatches
                .album
                .into_vec()
                .into_iter()
                .next()
                .map(|m| LastFmAlbumMatch {
                    artist: m.artist,
                    album: m.name,
                    url: m.url,
                })
        }))
    }

    /// Call an API method. `Ok(None)` when Last.fm reports "not found".
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<Option<T>> {
        let mut url = format!(
            "{}?method={}&api_key={}&format=json",
            LASTFM_API_BASE,
            method,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        debug!(method = %method, "Querying Last.fm");

        // Apply rate limiting
        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Last.fm request failed: {}", e)))?;

        // Last.fm also uses 4xx statuses alongside an error body.
        if let Ok(error_resp) = serde_json::from_slice::<ErrorResponse>(&response.body) {
            return match error_resp.error {
                ERROR_NOT_FOUND => {
                    debug!(method = %method, "Not found on Last.fm");
                    Ok(None)
                }
                code => Err(MetadataError::RemoteApi(format!(
                    "Last.fm API error {}: {}",
                    code, error_resp.message
                ))),
            };
        }

        ensure_success("Last.fm", &response)?;

        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| MetadataError::JsonParse(format!("Failed to parse Last.fm response: {}", e)))
    }
}

fn names(items: OneOrMany<Named>) -> Vec<String> {
    items
        .into_vec()
        .into_iter()
        .map(|n| n.name.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

fn tag_names(items: OneOrMany<Named>, limit: usize) -> Vec<String> {
    names(items)
        .into_iter()
        .map(|t| t.to_lowercase())
        .take(limit)
        .collect()
}
