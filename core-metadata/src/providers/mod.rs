//! External Music Providers
//!
//! This module contains clients for the catalogs the discovery feature
//! talks to:
//! - Spotify - artist search, related artists, releases
//! - Last.fm - similar artists and community tags
//! - Bandcamp - album search used to find a store link
//!
//! Each provider implements rate limiting and error handling to comply
//! with API terms of service.

pub mod bandcamp;
pub mod lastfm;
pub mod spotify;

pub use bandcamp::{BandcampSearch, StoreLink};
pub use lastfm::{LastFmAlbumMatch, LastFmClient};
pub use spotify::{CatalogAlbum, SpotifyArtist, SpotifyClient};

use crate::error::{MetadataError, Result};
use bridge_traits::http::HttpResponse;
use serde::Deserialize;

/// Map throttling and non-2xx statuses to errors.
pub(crate) fn ensure_success(provider: &str, response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    if response.status == 429 {
        let retry_after = response.retry_after().map_or(60, |wait| wait.as_secs());

        return Err(MetadataError::RateLimited {
            provider: provider.to_string(),
            retry_after_seconds: retry_after,
        });
    }

    Err(MetadataError::HttpError {
        status: response.status,
        body: response.text_lossy(),
    })
}

/// APIs that collapse single-element lists into a bare object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_reads_retry_after() {
        let response = HttpResponse::new(429, "slow down").with_header("retry-after", "12");

        match ensure_success("Spotify", &response) {
            Err(MetadataError::RateLimited {
                provider,
                retry_after_seconds,
            }) => {
                assert_eq!(provider, "Spotify");
                assert_eq!(retry_after_seconds, 12);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_rate_limited_default_delay() {
        let response = HttpResponse::new(429, "");
        assert!(matches!(
            ensure_success("Last.fm", &response),
            Err(MetadataError::RateLimited {
                retry_after_seconds: 60,
                ..
            })
        ));
    }

    #[test]
    fn test_http_error_keeps_body() {
        let response = HttpResponse::new(503, "maintenance");
        match ensure_success("Last.fm", &response) {
            Err(MetadataError::HttpError { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(ensure_success("x", &HttpResponse::new(204, "")).is_ok());
    }

    #[test]
    fn test_one_or_many() {
        let many: OneOrMany<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(many.into_vec(), vec![1, 2]);

        let one: OneOrMany<u32> = serde_json::from_str("3").unwrap();
        assert_eq!(one.into_vec(), vec![3]);
    }
}
