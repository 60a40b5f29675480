//! Platform detection and per-site request headers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where a posted link points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Spotify,
    Bandcamp,
    Tidal,
    AppleMusic,
    Deezer,
    YouTubeMusic,
    SoundCloud,
    Genius,
    LastFm,
    Pandora,
    AmazonMusic,
    JioSaavn,
    Other,
}

/// URL substrings checked in order; the first hit wins.
const PLATFORM_MARKERS: &[(&str, Platform)] = &[
    ("spotify", Platform::Spotify),
    ("bandcamp", Platform::Bandcamp),
    ("tidal", Platform::Tidal),
    ("music.apple", Platform::AppleMusic),
    ("deezer", Platform::Deezer),
    ("youtube", Platform::YouTubeMusic),
    ("soundcloud", Platform::SoundCloud),
    ("genius", Platform::Genius),
    ("last.fm", Platform::LastFm),
    ("pandora", Platform::Pandora),
    ("amazon", Platform::AmazonMusic),
    ("jiosaavn", Platform::JioSaavn),
];

impl Platform {
    /// Human readable label stored with each album.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::Bandcamp => "Bandcamp",
            Platform::Tidal => "Tidal",
            Platform::AppleMusic => "Apple Music",
            Platform::Deezer => "Deezer",
            Platform::YouTubeMusic => "YouTube Music",
            Platform::SoundCloud => "SoundCloud",
            Platform::Genius => "Genius",
            Platform::LastFm => "Last.fm",
            Platform::Pandora => "Pandora",
            Platform::AmazonMusic => "Amazon Music",
            Platform::JioSaavn => "JioSaavn",
            Platform::Other => "Other",
        }
    }

    /// How long a page fetch may take before it counts as failed.
    pub fn fetch_timeout(&self) -> Duration {
        match self {
            Platform::Bandcamp => Duration::from_secs(20),
            _ => Duration::from_secs(10),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detect the platform of a URL by case-insensitive substring match.
pub fn detect_platform(url: &str) -> Platform {
    let url = url.to_lowercase();
    PLATFORM_MARKERS
        .iter()
        .find(|(marker, _)| url.contains(marker))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Other)
}

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 14_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1";
const BOT_UA: &str = "Mozilla/5.0 (compatible; BandcampBot/1.0)";

const ACCEPT_RICH: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const ACCEPT_PLAIN: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Browser-like header sets. Pages that sniff for bots get served an
/// empty shell otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    Bandcamp,
    Spotify,
    Generic,
    Mobile,
    Desktop,
    Minimal,
}

impl HeaderProfile {
    /// Profiles tried in order after the primary Bandcamp fetch failed.
    pub const BANDCAMP_FALLBACKS: [HeaderProfile; 3] = [
        HeaderProfile::Mobile,
        HeaderProfile::Desktop,
        HeaderProfile::Minimal,
    ];

    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Bandcamp => HeaderProfile::Bandcamp,
            Platform::Spotify => HeaderProfile::Spotify,
            _ => HeaderProfile::Generic,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HeaderProfile::Bandcamp => "bandcamp",
            HeaderProfile::Spotify => "spotify",
            HeaderProfile::Generic => "generic",
            HeaderProfile::Mobile => "mobile",
            HeaderProfile::Desktop => "desktop",
            HeaderProfile::Minimal => "minimal",
        }
    }

    /// Header pairs for this profile. Content encoding is left to the
    /// HTTP client so responses are decompressed transparently.
    pub fn headers(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            HeaderProfile::Bandcamp => vec![
                ("User-Agent", CHROME_UA),
                ("Accept", ACCEPT_RICH),
                ("Accept-Language", "en-US,en;q=0.9"),
                ("DNT", "1"),
                ("Upgrade-Insecure-Requests", "1"),
                ("Referer", "https://bandcamp.com/"),
                ("Cache-Control", "no-cache"),
            ],
            HeaderProfile::Spotify => vec![
                ("User-Agent", CHROME_UA),
                ("Accept", ACCEPT_RICH),
                ("Accept-Language", "en-US,en;q=0.9"),
            ],
            HeaderProfile::Generic => vec![
                ("User-Agent", CHROME_UA),
                ("Accept", ACCEPT_PLAIN),
                ("Accept-Language", "en-US,en;q=0.5"),
                ("DNT", "1"),
                ("Upgrade-Insecure-Requests", "1"),
            ],
            HeaderProfile::Mobile => vec![
                ("User-Agent", IPHONE_UA),
                ("Accept", ACCEPT_PLAIN),
                ("Accept-Language", "en-us"),
            ],
            HeaderProfile::Desktop => vec![
                ("User-Agent", CHROME_UA),
                ("Accept", ACCEPT_RICH),
                ("Accept-Language", "en-US,en;q=0.9"),
            ],
            HeaderProfile::Minimal => vec![("User-Agent", BOT_UA), ("Accept", ACCEPT_PLAIN)],
        }
    }
}
