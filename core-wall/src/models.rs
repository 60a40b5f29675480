//! Domain models for the wall
//!
//! This module contains the records users post, with validation and the
//! row types used for database mapping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Result;
use crate::tags::TagList;

/// Platform label stored for manual submissions.
pub const MANUAL_PLATFORM: &str = "Other";

// =============================================================================
// Album
// =============================================================================

/// An album shared by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    /// Unique identifier
    pub id: String,
    /// Handle of the user who posted it
    pub username: String,
    /// Link to the release (unique across the wall)
    pub url: String,
    pub artist: String,
    pub album_name: String,
    pub cover_url: Option<String>,
    /// Source platform label ("Bandcamp", "Spotify", ...)
    pub platform: String,
    pub tags: TagList,
    /// Users who liked the album, sorted by handle
    pub likers: Vec<String>,
    /// Unix timestamp (seconds)
    pub created_at: i64,
}

impl Album {
    /// Create a new album owned by `username`
    pub fn new(
        username: impl Into<String>,
        url: impl Into<String>,
        artist: impl Into<String>,
        album_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            url: url.into(),
            artist: artist.into(),
            album_name: album_name.into(),
            cover_url: None,
            platform: MANUAL_PLATFORM.to_string(),
            tags: TagList::empty(),
            likers: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_cover_url(mut self, cover_url: Option<String>) -> Self {
        self.cover_url = cover_url.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_tags(mut self, tags: TagList) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn like_count(&self) -> usize {
        self.likers.len()
    }

    pub fn is_liked_by(&self, username: &str) -> bool {
        self.likers.iter().any(|u| u == username)
    }

    /// Validate album data
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Album owner cannot be empty".to_string());
        }
        validate_url(&self.url)?;
        if self.artist.trim().is_empty() {
            return Err("Artist cannot be empty".to_string());
        }
        if self.album_name.trim().is_empty() {
            return Err("Album name cannot be empty".to_string());
        }
        if self.platform.trim().is_empty() {
            return Err("Platform cannot be empty".to_string());
        }
        Ok(())
    }
}

fn validate_url(url: &str) -> std::result::Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("Album URL cannot be empty".to_string());
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(format!("Album URL must start with http:// or https://: {}", url));
    }
    Ok(())
}

/// Raw `albums` row with its likers aggregated as a JSON array
#[derive(Debug, FromRow)]
pub(crate) struct AlbumRow {
    pub id: String,
    pub username: String,
    pub url: String,
    pub artist: String,
    pub album_name: String,
    pub cover_url: Option<String>,
    pub platform: String,
    pub tags: String,
    pub likers: String,
    pub created_at: i64,
}

impl TryFrom<AlbumRow> for Album {
    type Error = crate::error::LibraryError;

    fn try_from(row: AlbumRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            username: row.username,
            url: row.url,
            artist: row.artist,
            album_name: row.album_name,
            cover_url: row.cover_url,
            platform: row.platform,
            tags: TagList::from_json(&row.tags)?,
            likers: parse_likers(&row.likers)?,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Concert
// =============================================================================

/// An upcoming gig announced by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concert {
    pub id: String,
    pub username: String,
    /// Free-text line-up
    pub bands: String,
    pub date: NaiveDate,
    pub venue: String,
    pub city: String,
    pub tags: TagList,
    /// Free-text details (tickets, doors, ...)
    pub info: String,
    pub likers: Vec<String>,
    pub created_at: i64,
}

impl Concert {
    pub fn new(
        username: impl Into<String>,
        bands: impl Into<String>,
        date: NaiveDate,
        venue: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            bands: bands.into(),
            date,
            venue: venue.into(),
            city: city.into(),
            tags: TagList::empty(),
            info: String::new(),
            likers: Vec::new(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_tags(mut self, tags: TagList) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    /// Whole days from `today` until the gig. Negative once it is over.
    pub fn days_until(&self, today: NaiveDate) -> i64 {
        (self.date - today).num_days()
    }

    pub fn like_count(&self) -> usize {
        self.likers.len()
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Concert owner cannot be empty".to_string());
        }
        if self.bands.trim().is_empty() {
            return Err("Bands cannot be empty".to_string());
        }
        if self.venue.trim().is_empty() {
            return Err("Venue cannot be empty".to_string());
        }
        if self.city.trim().is_empty() {
            return Err("City cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ConcertRow {
    pub id: String,
    pub username: String,
    pub bands: String,
    pub date: NaiveDate,
    pub venue: String,
    pub city: String,
    pub tags: String,
    pub info: String,
    pub likers: String,
    pub created_at: i64,
}

impl TryFrom<ConcertRow> for Concert {
    type Error = crate::error::LibraryError;

    fn try_from(row: ConcertRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            username: row.username,
            bands: row.bands,
            date: row.date,
            venue: row.venue,
            city: row.city,
            tags: TagList::from_json(&row.tags)?,
            info: row.info,
            likers: parse_likers(&row.likers)?,
            created_at: row.created_at,
        })
    }
}

fn parse_likers(raw: &str) -> Result<Vec<String>> {
    let mut likers: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| crate::error::LibraryError::Corrupt(format!("likers: {}", e)))?;
    likers.sort();
    Ok(likers)
}

// =============================================================================
// Discovery
// =============================================================================

/// A random discovery a user ran, kept as history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Discovery {
    pub id: String,
    pub username: String,
    /// Seed album the discovery started from
    pub base_artist: String,
    pub base_album: String,
    pub discovered_artist: String,
    pub discovered_album: String,
    pub discovered_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: i64,
}

impl Discovery {
    pub fn new(
        username: impl Into<String>,
        base_artist: impl Into<String>,
        base_album: impl Into<String>,
        discovered_artist: impl Into<String>,
        discovered_album: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            base_artist: base_artist.into(),
            base_album: base_album.into(),
            discovered_artist: discovered_artist.into(),
            discovered_album: discovered_album.into(),
            discovered_url: None,
            cover_url: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_links(mut self, discovered_url: Option<String>, cover_url: Option<String>) -> Self {
        self.discovered_url = discovered_url;
        self.cover_url = cover_url;
        self
    }
}

// =============================================================================
// Likes
// =============================================================================

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    /// Whether the user likes the item after the toggle
    pub liked: bool,
    /// Like count after the toggle
    pub count: i64,
}
