//! Tag parsing and storage representation.
//!
//! Tags are free text typed by users (`#blackmetal #Doom raw_black`). They are
//! normalized once, on the way in, and persisted as a JSON array.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LibraryError, Result};

/// Maximum number of tags kept per post.
pub const MAX_TAGS: usize = 5;

/// Normalized, bounded list of tags.
///
/// Every entry is lowercase, has no leading `#`, consists of alphanumerics
/// and underscores only, and appears once. At most [`MAX_TAGS`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Normalize arbitrary tokens, dropping invalid ones and anything past
    /// the fifth accepted tag.
    pub fn from_tags<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
        for token in tokens {
            if tags.len() == MAX_TAGS {
                break;
            }
            if let Some(tag) = normalize_tag(token.as_ref()) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        Self(tags)
    }

    /// Add a tag, keeping the list bounded. Returns whether it was added.
    pub fn push(&mut self, token: &str) -> bool {
        match normalize_tag(token) {
            Some(tag) if self.0.len() < MAX_TAGS && !self.0.contains(&tag) => {
                self.0.push(tag);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|t| self.0.contains(&t))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse the stored JSON representation.
    pub fn from_json(raw: &str) -> Result<Self> {
        let values: Vec<String> = serde_json::from_str(raw)
            .map_err(|e| LibraryError::Corrupt(format!("tags column: {}", e)))?;
        Ok(Self::from_tags(values))
    }
}

impl TryFrom<Vec<String>> for TagList {
    type Error = String;

    fn try_from(values: Vec<String>) -> std::result::Result<Self, Self::Error> {
        if values.len() > MAX_TAGS {
            return Err(format!("at most {} tags are allowed", MAX_TAGS));
        }
        Ok(Self::from_tags(values))
    }
}

impl From<TagList> for Vec<String> {
    fn from(tags: TagList) -> Self {
        tags.0
    }
}

impl fmt::Display for TagList {
    /// Renders as `#tag1 #tag2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.0.iter().map(|t| format!("#{}", t)).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

fn normalize_tag(token: &str) -> Option<String> {
    let token = token.trim();
    let token = token.strip_prefix('#').unwrap_or(token);
    let without_underscores: String = token.chars().filter(|c| *c != '_').collect();
    if without_underscores.is_empty() || !without_underscores.chars().all(char::is_alphanumeric) {
        return None;
    }
    Some(token.to_lowercase())
}

/// Parse a whitespace-separated tag string as typed in a post form.
///
/// ```
/// use core_wall::tags::process_tags;
///
/// let tags = process_tags("#BlackMetal #doom not-a-tag raw_black");
/// assert_eq!(tags.as_slice(), ["blackmetal", "doom", "raw_black"]);
/// ```
pub fn process_tags(input: &str) -> TagList {
    TagList::from_tags(input.split_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_tags_strips_hash_and_lowercases() {
        let tags = process_tags("#Thrash #SPEED metal");
        assert_eq!(tags.as_slice(), ["thrash", "speed", "metal"]);
    }

    #[test]
    fn test_process_tags_drops_invalid_tokens() {
        let tags = process_tags("post-metal #nwobhm ## _ black_metal !!");
        assert_eq!(tags.as_slice(), ["nwobhm", "black_metal"]);
    }

    #[test]
    fn test_process_tags_truncates_to_five() {
        let tags = process_tags("a b c d e f g");
        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(tags.as_slice().last().map(String::as_str), Some("e"));
    }

    #[test]
    fn test_process_tags_dedupes_before_truncating() {
        let tags = process_tags("doom DOOM #doom sludge stoner drone funeral");
        assert_eq!(
            tags.as_slice(),
            ["doom", "sludge", "stoner", "drone", "funeral"]
        );
    }

    #[test]
    fn test_process_tags_accepts_unicode_letters() {
        let tags = process_tags("#metalespañol");
        assert_eq!(tags.as_slice(), ["metalespañol"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(process_tags("   ").is_empty());
    }

    #[test]
    fn test_json_storage_format() {
        let tags = process_tags("#death #grind");
        assert_eq!(tags.to_json(), r#"["death","grind"]"#);
        assert_eq!(TagList::from_json(&tags.to_json()).unwrap(), tags);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(matches!(
            TagList::from_json("{'a': 1}"),
            Err(LibraryError::Corrupt(_))
        ));
    }

    #[test]
    fn test_push_respects_bounds() {
        let mut tags = process_tags("a b c d");
        assert!(tags.push("#E"));
        assert!(!tags.push("f"));
        assert!(!tags.push("a"));
        assert!(tags.contains("#e"));
    }

    #[test]
    fn test_display() {
        assert_eq!(process_tags("black doom").to_string(), "#black #doom");
    }

    #[test]
    fn test_deserialize_rejects_too_many() {
        let result: std::result::Result<TagList, _> =
            serde_json::from_str(r#"["a","b","c","d","e","f"]"#);
        assert!(result.is_err());
    }
}
