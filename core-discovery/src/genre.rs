//! Metal genre classification over free-form tags.

/// Substrings that mark a tag as metal or metal-adjacent.
const METAL_KEYWORDS: &[&str] = &[
    "metal", "grindcore", "goregrind", "deathcore", "metalcore", "hardcore", "djent", "grunge",
    "sludge", "stoner", "crossover thrash", "thrash", "death", "black", "doom", "grind", "core",
    "gore",
];

/// Genres that disqualify a release when they outweigh the metal tags.
const BLACKLIST: &[&str] = &[
    "pop", "hip hop", "hip-hop", "rap", "country", "edm", "reggaeton", "k-pop", "jazz",
    "classical", "r&b", "trap", "latin", "dance",
];

/// Keywords used when filtering an artist's own tags for discovery tags.
const METALISH: &[&str] = &["metal", "death", "thrash", "doom", "grind", "black", "core"];

pub fn is_metal_tag(tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    !tag.is_empty() && METAL_KEYWORDS.iter().any(|k| tag.contains(k))
}

/// A blacklisted genre appears as a whole word and nothing marks the tag
/// as metal ("pop punk" is blacklisted, "rap metal" is not).
pub fn is_blacklisted_tag(tag: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() || is_metal_tag(&tag) {
        return false;
    }
    let words: Vec<&str> = tag.split(|c: char| c.is_whitespace() || c == '/').collect();
    BLACKLIST.iter().any(|term| {
        tag == *term
            || words.contains(term)
            || (term.contains(' ') && tag.contains(term))
    })
}

pub fn is_metalish_tag(tag: &str) -> bool {
    let tag = tag.to_lowercase();
    METALISH.iter().any(|k| tag.contains(k))
}

/// Counts behind a classification, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenreVerdict {
    pub metal: usize,
    pub blacklisted: usize,
}

impl GenreVerdict {
    pub fn is_metal(&self) -> bool {
        self.metal > 0 && self.blacklisted <= self.metal
    }
}

pub fn classify<S: AsRef<str>>(tags: &[S]) -> GenreVerdict {
    tags.iter().fold(GenreVerdict::default(), |mut verdict, tag| {
        let tag = tag.as_ref();
        if is_metal_tag(tag) {
            verdict.metal += 1;
        } else if is_blacklisted_tag(tag) {
            verdict.blacklisted += 1;
        }
        verdict
    })
}

pub fn is_metal<S: AsRef<str>>(tags: &[S]) -> bool {
    classify(tags).is_metal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metal_tags() {
        assert!(is_metal_tag("Black Metal"));
        assert!(is_metal_tag("blackgaze"));
        assert!(is_metal_tag("post-metal"));
        assert!(is_metal_tag("Grindcore"));
        assert!(!is_metal_tag("shoegaze"));
        assert!(!is_metal_tag(""));
    }

    #[test]
    fn test_blacklisted_tags() {
        assert!(is_blacklisted_tag("pop"));
        assert!(is_blacklisted_tag("K-Pop"));
        assert!(is_blacklisted_tag("pop punk"));
        assert!(is_blacklisted_tag("hip hop"));
        assert!(is_blacklisted_tag("jazz/fusion"));
        assert!(!is_blacklisted_tag("rap metal"));
        assert!(!is_blacklisted_tag("popular"));
        assert!(!is_blacklisted_tag("shoegaze"));
    }

    #[test]
    fn test_classification() {
        assert!(is_metal(&["death metal", "brutal death metal", "seen live"]));
        assert!(is_metal(&["black metal", "pop"]));
        assert!(!is_metal(&["pop", "dance", "black metal"]));
        assert!(!is_metal(&["pop", "rap"]));
        assert!(!is_metal::<&str>(&[]));
        assert!(!is_metal(&["indie", "female vocalists"]));
    }

    #[test]
    fn test_verdict_counts() {
        let verdict = classify(&["doom metal", "jazz", "stoner rock", "sludge"]);
        assert_eq!(verdict, GenreVerdict { metal: 3, blacklisted: 1 });
        assert!(verdict.is_metal());
    }

    #[test]
    fn test_metalish() {
        assert!(is_metalish_tag("Thrash"));
        assert!(!is_metalish_tag("seen live"));
    }
}
