//! Bandcamp album search
//!
//! Scrapes `https://bandcamp.com/search?q={query}&item_type=a` to find a
//! store page for a discovered release.

use crate::error::{MetadataError, Result};
use crate::extractor::{css, element_text};
use crate::platform::HeaderProfile;
use crate::providers::ensure_success;
use crate::rate_limit::RateLimiter;
use bridge_traits::http::{HttpClient, HttpRequest};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const BANDCAMP_SEARCH_URL: &str = "https://bandcamp.com/search";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

static RESULT: Lazy<Selector> = Lazy::new(|| css(".searchresult"));
static HEADING_LINK: Lazy<Selector> = Lazy::new(|| css(".heading a"));
static SUBHEAD: Lazy<Selector> = Lazy::new(|| css(".subhead"));
static ITEM_URL: Lazy<Selector> = Lazy::new(|| css(".itemurl a"));
static ART: Lazy<Selector> = Lazy::new(|| css(".art img"));

/// A Bandcamp album page found by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLink {
    pub url: String,
    pub artist: String,
    pub album: String,
    pub cover_url: Option<String>,
}

/// Bandcamp search scraper
pub struct BandcampSearch {
    http_client: Arc<dyn HttpClient>,
    rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl BandcampSearch {
    pub fn new(http_client: Arc<dyn HttpClient>, rate_limit_delay_ms: u64) -> Self {
        Self {
            http_client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(rate_limit_delay_ms))),
        }
    }

    /// First album result whose artist matches `artist`, ignoring case,
    /// spacing and punctuation.
    pub async fn search(&self, artist: &str, album: &str) -> Result<Option<StoreLink>> {
        let query = format!("{} {}", artist, album);
        let results = self.search_albums(query.trim()).await?;
        let wanted = loose_key(artist);

        let found = results.into_iter().find(|r| loose_key(&r.artist) == wanted);
        if found.is_none() {
            debug!(artist = %artist, album = %album, "No matching Bandcamp result");
        }
        Ok(found)
    }

    /// All album results for a free-text query, in page order.
    pub async fn search_albums(&self, query: &str) -> Result<Vec<StoreLink>> {
        let url = format!(
            "{}?q={}&item_type=a",
            BANDCAMP_SEARCH_URL,
            urlencoding::encode(query)
        );

        self.rate_limiter.lock().await.wait_if_needed().await;

        let request = HttpRequest::get(url)
            .headers(HeaderProfile::Bandcamp.headers())
            .timeout(REQUEST_TIMEOUT);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| MetadataError::NetworkError(format!("Bandcamp search failed: {}", e)))?;

        ensure_success("Bandcamp", &response)?;

        Ok(parse_search_results(&response.text_lossy()))
    }
}

/// Lowercase alphanumerics only.
fn loose_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Drop the tracking query Bandcamp appends to result links.
fn clean_link(href: &str) -> String {
    href.split('?').next().unwrap_or(href).trim().to_string()
}

/// Parse a Bandcamp search results page.
pub fn parse_search_results(html: &str) -> Vec<StoreLink> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT)
        .filter_map(|result| {
            let heading = result.select(&HEADING_LINK).next()?;
            let album = element_text(&heading);

            let url = heading
                .value()
                .attr("href")
                .or_else(|| {
                    result
                        .select(&ITEM_URL)
                        .next()
                        .and_then(|el| el.value().attr("href"))
                })
                .map(clean_link)
                .unwrap_or_default();

            let artist = result
                .select(&SUBHEAD)
                .next()
                .map(|el| {
                    let text = el.text().collect::<Vec<_>>().join(" ");
                    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    text.trim_start_matches("by ").to_string()
                })
                .unwrap_or_default();

            let cover_url = result
                .select(&ART)
                .next()
                .and_then(|el| el.value().attr("src"))
                .map(str::to_string);

            (!url.is_empty() && !album.is_empty()).then_some(StoreLink {
                url,
                artist,
                album,
                cover_url,
            })
        })
        .collect()
}
