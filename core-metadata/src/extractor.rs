//! Page metadata extraction
//!
//! Fetches a music page and pulls artist, album title and cover art out of
//! its HTML. Bandcamp pages go through the multi-strategy parser in
//! [`crate::bandcamp`]; everything else relies on Open Graph and Twitter
//! card metadata.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::MetadataExtractor;
//!
//! let extractor = MetadataExtractor::new(http_client);
//! if let Some(meta) = extractor.extract("https://band.bandcamp.com/album/x").await? {
//!     println!("{} - {}", meta.artist, meta.album_name);
//! }
//! ```

use crate::bandcamp::parse_bandcamp;
use crate::error::{MetadataError, Result};
use crate::platform::{detect_platform, HeaderProfile, Platform};
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// What a page told us about the release it links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub artist: String,
    pub album_name: String,
    pub cover_url: Option<String>,
    pub platform: Platform,
}

impl ExtractedMetadata {
    /// True when neither artist nor album could be determined.
    pub fn is_unknown(&self) -> bool {
        self.artist == UNKNOWN_ARTIST && self.album_name == UNKNOWN_ALBUM
    }
}

/// Fetches pages through the host HTTP client and parses them.
pub struct MetadataExtractor {
    http_client: Arc<dyn HttpClient>,
}

impl MetadataExtractor {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    /// Extract metadata for a posted link.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(_))` - the page yielded metadata
    /// - `Ok(None)` - the page could not be fetched or had nothing usable
    /// - `Err(MetadataError::InvalidUrl)` - the input is not an http(s) URL
    pub async fn extract(&self, url: &str) -> Result<Option<ExtractedMetadata>> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MetadataError::InvalidUrl(url.to_string()));
        }

        let platform = detect_platform(url);
        let primary = HeaderProfile::for_platform(platform);
        debug!(url = %url, platform = %platform, "Extracting page metadata");

        if let Some(html) = self.fetch(url, platform, primary).await {
            let metadata = match platform {
                Platform::Bandcamp => parse_bandcamp(&html),
                _ => parse_generic(&html, platform),
            };
            if metadata.is_none() {
                info!(url = %url, "Page had no usable metadata");
            }
            return Ok(metadata);
        }

        if platform != Platform::Bandcamp {
            return Ok(None);
        }

        for profile in HeaderProfile::BANDCAMP_FALLBACKS {
            debug!(profile = profile.name(), "Retrying Bandcamp page with fallback headers");
            if let Some(html) = self.fetch(url, platform, profile).await {
                if let Some(metadata) = parse_bandcamp(&html) {
                    info!(profile = profile.name(), "Bandcamp fallback succeeded");
                    return Ok(Some(metadata));
                }
            }
        }

        warn!(url = %url, "All Bandcamp header profiles failed");
        Ok(None)
    }

    /// Fetch a page body. Anything but a 200 counts as a miss.
    async fn fetch(&self, url: &str, platform: Platform, profile: HeaderProfile) -> Option<String> {
        let request = HttpRequest::get(url)
            .headers(profile.headers())
            .timeout(platform.fetch_timeout());

        match self
            .http_client
            .execute_with_retry(request, RetryPolicy::none())
            .await
        {
            Ok(response) if response.status == 200 => Some(response.text_lossy()),
            Ok(response) => {
                warn!(
                    status = response.status,
                    profile = profile.name(),
                    "Page fetch returned non-success status"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, profile = profile.name(), "Page fetch failed");
                None
            }
        }
    }
}

static META_PROPERTY: Lazy<Selector> = Lazy::new(|| css("meta[property]"));
static META_NAME: Lazy<Selector> = Lazy::new(|| css("meta[name]"));
static TITLE: Lazy<Selector> = Lazy::new(|| css("title"));

static BY_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)by (.+?)$|by (.+?) on").expect("valid regex"));

/// Compile a selector known at build time.
pub(crate) fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid selector")
}

/// Trimmed text content of an element.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Content of the first `<meta property=...>` tag with the given property.
pub(crate) fn meta_property(doc: &Html, property: &str) -> Option<String> {
    doc.select(&META_PROPERTY)
        .filter(|el| el.value().attr("property") == Some(property))
        .find_map(|el| non_empty(el.value().attr("content")))
}

/// Text of the `<title>` element.
pub(crate) fn page_title(doc: &Html) -> Option<String> {
    doc.select(&TITLE)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default)]
struct CardMetadata {
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

/// Open Graph first; Twitter cards and the plain description only when
/// there is no `og:title`; the `<title>` element last.
fn card_metadata(doc: &Html) -> CardMetadata {
    let mut card = CardMetadata {
        title: meta_property(doc, "og:title"),
        description: meta_property(doc, "og:description"),
        image: meta_property(doc, "og:image"),
    };

    if card.title.is_none() {
        for el in doc.select(&META_NAME) {
            let content = non_empty(el.value().attr("content"));
            if content.is_none() {
                continue;
            }
            let name = el.value().attr("name").unwrap_or_default().to_ascii_lowercase();
            match name.as_str() {
                "description" => card.description = content,
                "twitter:title" => card.title = content,
                "twitter:image" => card.image = content,
                _ => {}
            }
        }
    }

    if card.title.is_none() {
        card.title = page_title(doc);
    }

    card
}

fn artist_from(title: &str, description: &str) -> String {
    if title.contains(" - ") {
        if let Some(last) = title.rsplit(" - ").next() {
            return last.trim().to_string();
        }
    }

    if description.to_lowercase().contains("by") {
        let found = BY_DESCRIPTION.captures(description).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().trim().to_string())
        });
        if let Some(artist) = found.filter(|a| !a.is_empty()) {
            return artist;
        }
    }

    if title.contains(" by ") {
        if let Some(last) = title.rsplit(" by ").next() {
            return last.trim().to_string();
        }
    }

    UNKNOWN_ARTIST.to_string()
}

fn album_from(title: &str) -> String {
    if let Some((first, _)) = title.split_once(" - ") {
        return first.trim().to_string();
    }
    if let Some((first, _)) = title.split_once(" by ") {
        return first.trim().to_string();
    }
    if title.is_empty() {
        UNKNOWN_ALBUM.to_string()
    } else {
        title.to_string()
    }
}

/// Parse a non-Bandcamp page from its card metadata.
///
/// Returns `None` when the page has no title of any kind.
pub fn parse_generic(html: &str, platform: Platform) -> Option<ExtractedMetadata> {
    let doc = Html::parse_document(html);
    let card = card_metadata(&doc);
    let title = card.title?;
    let description = card.description.unwrap_or_default();

    Some(ExtractedMetadata {
        artist: artist_from(&title, &description),
        album_name: album_from(&title),
        cover_url: card.image,
        platform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(head: &str) -> String {
        format!("<html><head>{}</head><body></body></html>", head)
    }

    #[test]
    fn test_open_graph_dash_title() {
        let html = page(
            r#"<meta property="og:title" content="Transilvanian Hunger - Darkthrone">
               <meta property="og:image" content="https://img.example/cover.jpg">"#,
        );

        let meta = parse_generic(&html, Platform::Deezer).unwrap();
        assert_eq!(meta.artist, "Darkthrone");
        assert_eq!(meta.album_name, "Transilvanian Hunger");
        assert_eq!(meta.cover_url.as_deref(), Some("https://img.example/cover.jpg"));
        assert_eq!(meta.platform, Platform::Deezer);
    }

    #[test]
    fn test_artist_from_description() {
        let html = page(
            r#"<meta property="og:title" content="De Mysteriis Dom Sathanas">
               <meta property="og:description" content="Listen to the album by Mayhem">"#,
        );

        let meta = parse_generic(&html, Platform::Tidal).unwrap();
        assert_eq!(meta.artist, "Mayhem");
        assert_eq!(meta.album_name, "De Mysteriis Dom Sathanas");
        assert_eq!(meta.cover_url, None);
    }

    #[test]
    fn test_by_in_title() {
        let html = page(r#"<meta property="og:title" content="Nattens Madrigal by Ulver">"#);

        let meta = parse_generic(&html, Platform::Other).unwrap();
        assert_eq!(meta.artist, "Ulver");
        assert_eq!(meta.album_name, "Nattens Madrigal");
    }

    #[test]
    fn test_twitter_card_fallback() {
        let html = page(
            r#"<meta name="twitter:title" content="Filosofem - Burzum">
               <meta name="twitter:image" content="https://img.example/f.png">"#,
        );

        let meta = parse_generic(&html, Platform::SoundCloud).unwrap();
        assert_eq!(meta.artist, "Burzum");
        assert_eq!(meta.album_name, "Filosofem");
        assert_eq!(meta.cover_url.as_deref(), Some("https://img.example/f.png"));
    }

    #[test]
    fn test_meta_names_ignore_case() {
        let html = page(
            r#"<meta name="Twitter:Title" content="Under a Funeral Moon">
               <meta name="Description" content="Listen to the album by Darkthrone">
               <meta name="TWITTER:IMAGE" content="https://img.example/ufm.jpg">"#,
        );

        let meta = parse_generic(&html, Platform::Other).unwrap();
        assert_eq!(meta.artist, "Darkthrone");
        assert_eq!(meta.album_name, "Under a Funeral Moon");
        assert_eq!(meta.cover_url.as_deref(), Some("https://img.example/ufm.jpg"));
    }

    #[test]
    fn test_title_element_fallback() {
        let html = page("<title>  Someone's Playlist  </title>");

        let meta = parse_generic(&html, Platform::Other).unwrap();
        assert_eq!(meta.artist, UNKNOWN_ARTIST);
        assert_eq!(meta.album_name, "Someone's Playlist");
    }

    #[test]
    fn test_no_title_is_none() {
        assert!(parse_generic(&page(""), Platform::Other).is_none());
        assert!(parse_generic("not html at all", Platform::Other).is_none());
    }

    #[test]
    fn test_is_unknown() {
        let meta = ExtractedMetadata {
            artist: UNKNOWN_ARTIST.to_string(),
            album_name: UNKNOWN_ALBUM.to_string(),
            cover_url: None,
            platform: Platform::Other,
        };
        assert!(meta.is_unknown());
    }
}
