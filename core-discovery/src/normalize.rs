//! Artist name normalization and identity matching.

use core_runtime::config::IdentityMatchConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading articles dropped before comparing names.
const ARTICLES: &[&str] = &["the ", "los ", "las ", "el ", "la ", "die ", "der ", "das "];

/// Names shorter than this never match by containment alone.
const MIN_CONTAINMENT_LEN: usize = 4;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static PLATFORM_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*(?:[|\-]\s*|\bon\s+)(?:bandcamp|spotify|youtube music|youtube|soundcloud|apple music|deezer|tidal)\s*$",
    )
    .expect("valid regex")
});

/// Canonical form used for comparisons: lowercase, one leading article
/// removed, punctuation dropped, whitespace collapsed.
pub fn normalize_artist_name(name: &str) -> String {
    let mut normalized = name.trim().to_lowercase();

    if let Some(article) = ARTICLES.iter().find(|a| normalized.starts_with(*a)) {
        normalized = normalized[article.len()..].to_string();
    }

    let normalized = NON_WORD.replace_all(&normalized, "");
    WHITESPACE.replace_all(&normalized, " ").trim().to_string()
}

/// Strip scraping leftovers from a stored artist name. Returns an empty
/// string when nothing usable is left.
pub fn clean_artist_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.eq_ignore_ascii_case(core_metadata::UNKNOWN_ARTIST) {
        return String::new();
    }

    let mut cleaned = trimmed.to_string();
    // Suffixes can stack, e.g. "Band | Bandcamp | Spotify".
    while let Some(m) = PLATFORM_SUFFIX.find(&cleaned) {
        cleaned.truncate(m.start());
    }
    cleaned.trim().to_string()
}

/// Rule deciding whether a returned artist is the one that was asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdentityMatch {
    /// Normalized names must be equal.
    Exact,
    /// Equal, containing one another (shorter side at least four
    /// characters), or similar at or above `threshold`.
    Fuzzy { threshold: f64 },
}

impl Default for IdentityMatch {
    fn default() -> Self {
        IdentityMatch::Exact
    }
}

impl From<IdentityMatchConfig> for IdentityMatch {
    fn from(config: IdentityMatchConfig) -> Self {
        match config {
            IdentityMatchConfig::Exact => IdentityMatch::Exact,
            IdentityMatchConfig::Fuzzy { threshold } => IdentityMatch::Fuzzy { threshold },
        }
    }
}

impl IdentityMatch {
    pub fn matches(&self, requested: &str, returned: &str) -> bool {
        let requested = normalize_artist_name(requested);
        let returned = normalize_artist_name(returned);

        if requested.is_empty() || returned.is_empty() {
            return false;
        }
        if requested == returned {
            return true;
        }

        match self {
            IdentityMatch::Exact => false,
            IdentityMatch::Fuzzy { threshold } => {
                let shorter = requested.chars().count().min(returned.chars().count());
                let contained = requested.contains(&returned) || returned.contains(&requested);
                if contained && shorter >= MIN_CONTAINMENT_LEN {
                    return true;
                }
                similarity(&requested, &returned) >= *threshold
            }
        }
    }
}

/// Similarity of two already normalized names in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}
