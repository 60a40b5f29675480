//! Bandcamp page parser
//!
//! Bandcamp markup changes often and differs between album, track and
//! label pages, so several independent strategies are tried in order:
//!
//! 1. Embedded page data (`TralbumData`, `data-tralbum`, script scans)
//! 2. Open Graph tags
//! 3. JSON-LD structured data
//! 4. Known CSS selectors
//! 5. `<title>` patterns
//!
//! The first strategy that finds both artist and album wins; a cover found
//! by an earlier strategy is kept. When none do, the partial results are
//! merged with a last-resort scan of headings and images.

use crate::extractor::{
    css, element_text, meta_property, non_empty, page_title, ExtractedMetadata, UNKNOWN_ALBUM,
    UNKNOWN_ARTIST,
};
use crate::platform::Platform;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Cover art URL for a Bandcamp `art_id`.
pub fn cover_from_art_id(art_id: u64) -> String {
    format!("https://f4.bcbits.com/img/a{}_16.jpg", art_id)
}

fn regexes(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter().map(|s| css(s)).collect()
}

static TRALBUM_DATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)TralbumData\s*=\s*(\{.*?\});").expect("valid regex"));
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*//[^\n]*$").expect("valid regex"));

static ARTIST_SCANS: Lazy<Vec<Regex>> = Lazy::new(|| {
    regexes(&[
        r#""artist":"([^"]+)""#,
        r#"artist:\s*'([^']+)'"#,
        r#"artist:\s*"([^"]+)""#,
        r#"data-artist="([^"]+)""#,
    ])
});
static TITLE_SCANS: Lazy<Vec<Regex>> = Lazy::new(|| {
    regexes(&[
        r#""title":"([^"]+)""#,
        r#"title:\s*'([^']+)'"#,
        r#"title:\s*"([^"]+)""#,
        r#"data-item-title="([^"]+)""#,
    ])
});
static ART_ID_SCANS: Lazy<Vec<Regex>> =
    Lazy::new(|| regexes(&[r#""art_id":\s*(\d+)"#, r#"art_id:\s*(\d+)"#]));
static ART_URL_SCANS: Lazy<Vec<Regex>> =
    Lazy::new(|| regexes(&[r#""artUrl":"([^"]+)""#, r#"artUrl:\s*"([^"]+)""#]));

static BY_IN_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)by\s+([^,.]+)").expect("valid regex"));
static BY_IN_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i) by ").expect("valid regex"));

static SCRIPT: Lazy<Selector> = Lazy::new(|| css("script"));
static TRALBUM_ATTR: Lazy<Selector> = Lazy::new(|| css("[data-tralbum]"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| css(r#"script[type="application/ld+json"]"#));
static IMG: Lazy<Selector> = Lazy::new(|| css("img[src]"));
static HEADINGS: Lazy<Vec<Selector>> = Lazy::new(|| selectors(&["h1", "h2", "h3"]));

static ARTIST_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        ".artist span",
        ".artist a",
        ".artist",
        r#"span[itemprop="byArtist"]"#,
        r#"a[itemprop="byArtist"]"#,
        ".band-name",
        ".artist-name",
        "#band-name",
        "h3 span a",
        ".trackTitle span a",
        ".title-artist a",
    ])
});
static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        ".trackTitle",
        ".track-title",
        ".title",
        "h2.trackTitle",
        ".trackTitle span",
        r#"[itemprop="name"]"#,
        ".album-title",
        "#name-section h2",
        ".track-album",
    ])
});
static COVER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    selectors(&[
        "a.popupImage",
        "#tralbumArt",
        ".album-art",
        ".art img",
        ".track-art img",
        r#"[itemprop="image"]"#,
        "img.album-cover",
        ".cover-image img",
    ])
});

const JSON_LD_TYPES: &[&str] = &["MusicAlbum", "MusicRecording", "MusicGroup"];

/// Partial result of one strategy.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Candidate {
    artist: Option<String>,
    album: Option<String>,
    cover: Option<String>,
}

fn usable(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty()
        || value == "null"
        || value == UNKNOWN_ARTIST
        || value == UNKNOWN_ALBUM
    {
        None
    } else {
        Some(value.to_string())
    }
}

impl Candidate {
    fn offer_artist(&mut self, value: &str) {
        if self.artist.is_none() {
            self.artist = usable(value);
        }
    }

    fn offer_album(&mut self, value: &str) {
        if self.album.is_none() {
            self.album = usable(value);
        }
    }

    fn offer_cover(&mut self, value: &str) {
        if self.cover.is_none() {
            self.cover = usable(value).map(|url| {
                if url.starts_with("//") {
                    format!("https:{}", url)
                } else {
                    url
                }
            });
        }
    }

    fn is_complete(&self) -> bool {
        self.artist.is_some() && self.album.is_some()
    }

    fn is_empty(&self) -> bool {
        self.artist.is_none() && self.album.is_none() && self.cover.is_none()
    }

    fn fill_from(&mut self, other: &Candidate) {
        if self.artist.is_none() {
            self.artist = other.artist.clone();
        }
        if self.album.is_none() {
            self.album = other.album.clone();
        }
        if self.cover.is_none() {
            self.cover = other.cover.clone();
        }
    }

    fn into_metadata(self) -> ExtractedMetadata {
        ExtractedMetadata {
            artist: self.artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album_name: self.album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            cover_url: self.cover,
            platform: Platform::Bandcamp,
        }
    }
}

type Strategy = fn(&Html) -> Candidate;

const STRATEGIES: [(&str, Strategy); 5] = [
    ("page-data", from_page_data),
    ("open-graph", from_open_graph),
    ("json-ld", from_json_ld),
    ("markup", from_markup),
    ("title", from_title),
];

/// Parse a Bandcamp album or track page.
///
/// Returns `None` only when no strategy found anything at all.
pub fn parse_bandcamp(html: &str) -> Option<ExtractedMetadata> {
    let doc = Html::parse_document(html);
    let mut partials = Vec::with_capacity(STRATEGIES.len());

    for (name, strategy) in STRATEGIES {
        let mut candidate = strategy(&doc);
        if candidate.is_complete() {
            debug!(strategy = name, "Bandcamp metadata found");
            for partial in &partials {
                candidate.fill_from(partial);
            }
            return Some(candidate.into_metadata());
        }
        partials.push(candidate);
    }

    let mut merged = from_headings_and_images(&doc);
    for partial in &partials {
        merged.fill_from(partial);
    }

    if merged.is_empty() {
        debug!("No Bandcamp metadata found");
        None
    } else {
        debug!(complete = merged.is_complete(), "Using partial Bandcamp metadata");
        Some(merged.into_metadata())
    }
}

/// Pull fields out of a decoded `TralbumData` style object.
fn read_tralbum(data: &Value, candidate: &mut Candidate) {
    if let Some(artist) = data.get("artist").and_then(Value::as_str) {
        candidate.offer_artist(artist);
    }
    if let Some(title) = data.pointer("/current/title").and_then(Value::as_str) {
        candidate.offer_album(title);
    }
    if let Some(title) = data.get("album_title").and_then(Value::as_str) {
        candidate.offer_album(title);
    }
    let art_id = data.get("art_id").and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    });
    if let Some(art_id) = art_id {
        candidate.offer_cover(&cover_from_art_id(art_id));
    }
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|v| *v != "null")
    })
}

fn from_page_data(doc: &Html) -> Candidate {
    let mut candidate = Candidate::default();

    for el in doc.select(&TRALBUM_ATTR) {
        if let Some(raw) = el.value().attr("data-tralbum") {
            if let Ok(data) = serde_json::from_str::<Value>(raw) {
                read_tralbum(&data, &mut candidate);
            }
        }
    }

    let scripts: Vec<String> = doc
        .select(&SCRIPT)
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect();

    for text in scripts.iter().filter(|t| t.contains("TralbumData")) {
        if let Some(caps) = TRALBUM_DATA.captures(text) {
            let cleaned = LINE_COMMENT.replace_all(&caps[1], "");
            match serde_json::from_str::<Value>(&cleaned) {
                Ok(data) => read_tralbum(&data, &mut candidate),
                Err(e) => debug!(error = %e, "TralbumData is not plain JSON"),
            }
        }
    }

    for text in &scripts {
        if let Some(artist) = first_capture(&ARTIST_SCANS, text) {
            candidate.offer_artist(&artist);
        }
        if let Some(title) = first_capture(&TITLE_SCANS, text) {
            candidate.offer_album(&title);
        }
        if let Some(art_id) = first_capture(&ART_ID_SCANS, text).and_then(|id| id.parse().ok()) {
            candidate.offer_cover(&cover_from_art_id(art_id));
        }
        if let Some(url) = first_capture(&ART_URL_SCANS, text) {
            candidate.offer_cover(&url);
        }
    }

    candidate
}

fn from_open_graph(doc: &Html) -> Candidate {
    let mut candidate = Candidate::default();

    if let Some(title) = meta_property(doc, "og:title") {
        if title.contains(" - ") {
            let mut parts = title.split(" - ");
            if let (Some(artist), Some(album)) = (parts.next(), parts.next()) {
                candidate.offer_artist(artist);
                candidate.offer_album(album);
            }
        } else if let Some((album, artist)) = title.split_once(", by ") {
            candidate.offer_album(album);
            candidate.offer_artist(artist);
        }
    }

    if let Some(description) = meta_property(doc, "og:description") {
        let artist = BY_IN_DESCRIPTION
            .captures(&description)
            .and_then(|caps| caps.get(1))
            .and_then(|m| usable(m.as_str()));
        if artist.is_some() {
            candidate.artist = artist;
        }
    }

    if let Some(image) = meta_property(doc, "og:image") {
        candidate.offer_cover(&image);
    }

    candidate
}

fn name_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => value.get("name").and_then(Value::as_str),
        Value::Array(items) => items.first().and_then(name_of),
        _ => None,
    }
}

fn image_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => value.get("url").and_then(Value::as_str),
        Value::Array(items) => items.first().and_then(image_of),
        _ => None,
    }
}

fn has_music_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => JSON_LD_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| JSON_LD_TYPES.contains(&t)),
        _ => false,
    }
}

fn from_json_ld(doc: &Html) -> Candidate {
    let mut candidate = Candidate::default();

    for el in doc.select(&JSON_LD) {
        let raw = el.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };

        let items = match data {
            Value::Array(items) => items,
            other => vec![other],
        };

        for item in items.iter().filter(|item| has_music_type(item)) {
            let artist = ["byArtist", "author", "performer"]
                .iter()
                .find_map(|key| item.get(*key).and_then(name_of));
            if let Some(artist) = artist {
                candidate.offer_artist(artist);
            }
            if let Some(name) = item.get("name").and_then(Value::as_str) {
                candidate.offer_album(name);
            }
            if let Some(image) = item.get("image").and_then(image_of) {
                candidate.offer_cover(image);
            }
        }
    }

    candidate
}

fn first_text(doc: &Html, list: &[Selector]) -> Option<String> {
    list.iter().find_map(|selector| {
        doc.select(selector)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
    })
}

fn from_markup(doc: &Html) -> Candidate {
    let mut candidate = Candidate::default();

    if let Some(artist) = first_text(doc, &ARTIST_SELECTORS) {
        candidate.offer_artist(&artist);
    }
    if let Some(title) = first_text(doc, &TITLE_SELECTORS) {
        candidate.offer_album(&title);
    }

    let cover = COVER_SELECTORS.iter().find_map(|selector| {
        let el = doc.select(selector).next()?;
        match el.value().name() {
            "a" => non_empty(el.value().attr("href")),
            "img" => non_empty(el.value().attr("src")),
            _ => None,
        }
    });
    let cover = cover.or_else(|| {
        doc.select(&IMG)
            .filter(|el| {
                el.value()
                    .classes()
                    .any(|class| class.to_lowercase().contains("art"))
            })
            .find_map(|el| non_empty(el.value().attr("src")))
    });
    if let Some(cover) = cover {
        candidate.offer_cover(&cover);
    }

    candidate
}

fn strip_bandcamp_suffix(value: &str) -> String {
    value.replace("| Bandcamp", "").trim().to_string()
}

fn from_title(doc: &Html) -> Candidate {
    let mut candidate = Candidate::default();
    let Some(title) = page_title(doc) else {
        return candidate;
    };

    if title.contains(" | ") {
        let mut parts = title.split(" | ");
        if let (Some(album), Some(artist)) = (parts.next(), parts.next()) {
            candidate.offer_album(album);
            candidate.offer_artist(artist);
        }
    } else if let Some((artist, album)) = title.split_once(" - ") {
        candidate.offer_artist(artist);
        candidate.offer_album(&strip_bandcamp_suffix(album));
    } else if let Some(m) = BY_IN_TITLE.find(&title) {
        candidate.offer_album(&title[..m.start()]);
        candidate.offer_artist(&strip_bandcamp_suffix(&title[m.end()..]));
    }

    candidate
}

fn from_headings_and_images(doc: &Html) -> Candidate {
    let mut candidate = Candidate::default();

    let heading = HEADINGS.iter().find_map(|selector| {
        doc.select(selector)
            .map(|el| element_text(&el))
            .find(|text| !text.is_empty() && text.chars().count() < 100 && text.contains(" - "))
    });
    if let Some(heading) = heading {
        if let Some((artist, album)) = heading.split_once(" - ") {
            candidate.offer_artist(artist);
            candidate.offer_album(album);
        }
    }

    let cover = doc.select(&IMG).find_map(|el| {
        let src = el.value().attr("src")?;
        let lower = src.to_lowercase();
        let is_image = [".jpg", ".jpeg", ".png", ".gif"]
            .iter()
            .any(|ext| lower.contains(ext));
        let looks_like_cover = ["cover", "art", "album"]
            .iter()
            .any(|word| lower.contains(word));
        (is_image && looks_like_cover).then(|| src.to_string())
    });
    if let Some(cover) = cover {
        candidate.offer_cover(&cover);
    }

    candidate
}
