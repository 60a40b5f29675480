//! The wall façade
//!
//! Every write takes the [`SessionContext`] of the user acting; edits and
//! deletes are limited to the owner of the record.

use crate::error::{CoreError, Result};
use crate::seed::seed_from_album;
use chrono::{Local, NaiveDate};
use core_auth::SessionContext;
use core_discovery::{DiscoveryOutcome, DiscoveryService};
use core_metadata::{detect_platform, MetadataExtractor};
use core_wall::models::MANUAL_PLATFORM;
use core_wall::{
    process_tags, Album, AlbumRepository, Concert, ConcertRepository, Discovery,
    DiscoveryRepository, LibraryError, LikeState, Page, PageRequest, SqliteAlbumRepository,
    SqliteConcertRepository, SqliteDiscoveryRepository,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Album fields typed in by hand, for links the extractor cannot read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumDraft {
    pub url: String,
    pub artist: String,
    pub album_name: String,
    pub cover_url: Option<String>,
}

/// Concert fields as entered in the gig form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcertDraft {
    pub bands: String,
    pub date: NaiveDate,
    pub venue: String,
    pub city: String,
    pub info: String,
}

/// Activity shown on a user's profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub albums_posted: i64,
    pub likes_received: i64,
    pub concerts: i64,
}

#[derive(Clone)]
pub struct WallService {
    albums: Arc<dyn AlbumRepository>,
    concerts: Arc<dyn ConcertRepository>,
    discoveries: Arc<dyn DiscoveryRepository>,
    extractor: Option<Arc<MetadataExtractor>>,
    discovery: Option<Arc<DiscoveryService>>,
}

impl WallService {
    /// Service over the SQLite repositories of `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self::from_repositories(
            Arc::new(SqliteAlbumRepository::new(pool.clone())),
            Arc::new(SqliteConcertRepository::new(pool.clone())),
            Arc::new(SqliteDiscoveryRepository::new(pool)),
        )
    }

    pub fn from_repositories(
        albums: Arc<dyn AlbumRepository>,
        concerts: Arc<dyn ConcertRepository>,
        discoveries: Arc<dyn DiscoveryRepository>,
    ) -> Self {
        Self {
            albums,
            concerts,
            discoveries,
            extractor: None,
            discovery: None,
        }
    }

    pub fn with_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryService) -> Self {
        self.discovery = Some(Arc::new(discovery));
        self
    }

    pub fn albums(&self) -> Arc<dyn AlbumRepository> {
        Arc::clone(&self.albums)
    }

    pub fn discovery_enabled(&self) -> bool {
        self.discovery.is_some()
    }

    // ---------------------------------------------------------------------
    // Albums
    // ---------------------------------------------------------------------

    /// Post an album from a link, reading artist, title and cover from the
    /// page.
    #[instrument(skip(self, session), fields(user = %session.username))]
    pub async fn post_album_from_url(
        &self,
        session: &SessionContext,
        url: &str,
        tags: &str,
    ) -> Result<Album> {
        let url = url.trim();
        if url.is_empty() {
            return Err(CoreError::invalid("url", "Please paste a valid URL"));
        }
        self.ensure_url_available(url).await?;

        let extractor = self
            .extractor
            .as_ref()
            .ok_or_else(|| CoreError::NotConfigured("Metadata extraction".to_string()))?;
        let metadata = extractor
            .extract(url)
            .await?
            .ok_or_else(|| CoreError::ExtractionFailed(url.to_string()))?;

        let album = Album::new(
            session.username.clone(),
            url,
            metadata.artist,
            metadata.album_name,
        )
        .with_cover_url(metadata.cover_url)
        .with_platform(metadata.platform.label())
        .with_tags(process_tags(tags));

        self.albums.insert(&album).await?;
        info!(album_id = %album.id, platform = %album.platform, "Album posted");
        Ok(album)
    }

    /// Post an album with hand-entered metadata.
    #[instrument(skip(self, session, draft), fields(user = %session.username))]
    pub async fn post_album_manual(
        &self,
        session: &SessionContext,
        draft: AlbumDraft,
        tags: &str,
    ) -> Result<Album> {
        require("url", &draft.url, "Album URL is required")?;
        require("artist", &draft.artist, "Artist is required")?;
        require("album_name", &draft.album_name, "Album name is required")?;
        self.ensure_url_available(draft.url.trim()).await?;

        let album = Album::new(
            session.username.clone(),
            draft.url.trim(),
            draft.artist,
            draft.album_name,
        )
        .with_cover_url(non_blank(draft.cover_url))
        .with_platform(MANUAL_PLATFORM)
        .with_tags(process_tags(tags));

        self.albums.insert(&album).await?;
        info!(album_id = %album.id, "Album posted manually");
        Ok(album)
    }

    /// Replace the editable fields of an album the user posted.
    #[instrument(skip(self, session, draft), fields(user = %session.username))]
    pub async fn edit_album(
        &self,
        session: &SessionContext,
        album_id: &str,
        draft: AlbumDraft,
        tags: &str,
    ) -> Result<Album> {
        let mut album = self.owned_album(session, album_id).await?;

        let url = draft.url.trim().to_string();
        if url != album.url {
            self.ensure_url_available(&url).await?;
            let platform = detect_platform(&url);
            album.platform = platform.label().to_string();
        }
        album.url = url;
        album.artist = draft.artist;
        album.album_name = draft.album_name;
        album.cover_url = non_blank(draft.cover_url);
        album.tags = process_tags(tags);

        self.albums.update(&album).await?;
        info!(album_id, "Album edited");
        Ok(album)
    }

    #[instrument(skip(self, session), fields(user = %session.username))]
    pub async fn delete_album(&self, session: &SessionContext, album_id: &str) -> Result<()> {
        self.owned_album(session, album_id).await?;
        if !self.albums.delete(album_id).await? {
            return Err(LibraryError::NotFound {
                entity_type: "Album".to_string(),
                id: album_id.to_string(),
            }
            .into());
        }
        info!(album_id, "Album deleted");
        Ok(())
    }

    pub async fn toggle_album_like(
        &self,
        session: &SessionContext,
        album_id: &str,
    ) -> Result<LikeState> {
        Ok(self.albums.toggle_like(album_id, &session.username).await?)
    }

    /// Newest albums first, optionally only those carrying `tag`.
    pub async fn feed(&self, tag: Option<&str>, page: PageRequest) -> Result<Page<Album>> {
        Ok(self.albums.list(tag, page).await?)
    }

    /// Most liked albums first, optionally only those carrying `tag`.
    pub async fn ranking(&self, tag: Option<&str>, limit: u32) -> Result<Vec<Album>> {
        Ok(self.albums.ranking(tag, limit).await?)
    }

    pub async fn user_albums(&self, username: &str, page: PageRequest) -> Result<Page<Album>> {
        Ok(self.albums.list_by_user(username, page).await?)
    }

    pub async fn tags(&self) -> Result<Vec<String>> {
        Ok(self.albums.all_tags().await?)
    }

    // ---------------------------------------------------------------------
    // Concerts
    // ---------------------------------------------------------------------

    #[instrument(skip(self, session, draft), fields(user = %session.username))]
    pub async fn add_concert(
        &self,
        session: &SessionContext,
        draft: ConcertDraft,
        tags: &str,
    ) -> Result<Concert> {
        if draft.date < today() {
            return Err(CoreError::invalid("date", "Concert date is in the past"));
        }

        let concert = Concert::new(
            session.username.clone(),
            draft.bands,
            draft.date,
            draft.venue,
            draft.city,
        )
        .with_info(draft.info)
        .with_tags(process_tags(tags));

        self.concerts.insert(&concert).await?;
        info!(concert_id = %concert.id, date = %concert.date, "Concert added");
        Ok(concert)
    }

    #[instrument(skip(self, session, draft), fields(user = %session.username))]
    pub async fn edit_concert(
        &self,
        session: &SessionContext,
        concert_id: &str,
        draft: ConcertDraft,
        tags: &str,
    ) -> Result<Concert> {
        let mut concert = self.owned_concert(session, concert_id).await?;

        concert.bands = draft.bands;
        concert.date = draft.date;
        concert.venue = draft.venue;
        concert.city = draft.city;
        concert.info = draft.info;
        concert.tags = process_tags(tags);

        self.concerts.update(&concert).await?;
        info!(concert_id, "Concert edited");
        Ok(concert)
    }

    #[instrument(skip(self, session), fields(user = %session.username))]
    pub async fn delete_concert(&self, session: &SessionContext, concert_id: &str) -> Result<()> {
        self.owned_concert(session, concert_id).await?;
        self.concerts.delete(concert_id).await?;
        info!(concert_id, "Concert deleted");
        Ok(())
    }

    pub async fn toggle_concert_like(
        &self,
        session: &SessionContext,
        concert_id: &str,
    ) -> Result<LikeState> {
        Ok(self.concerts.toggle_like(concert_id, &session.username).await?)
    }

    /// Upcoming gigs, soonest first. Past gigs are purged first.
    pub async fn upcoming_concerts(&self, tag: Option<&str>) -> Result<Vec<Concert>> {
        self.upcoming_concerts_on(today(), tag).await
    }

    pub async fn upcoming_concerts_on(
        &self,
        today: NaiveDate,
        tag: Option<&str>,
    ) -> Result<Vec<Concert>> {
        // Purging is best effort; the listing filters by date anyway.
        match self.concerts.purge_before(today).await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Purged past concerts"),
            Err(e) => warn!(error = %e, "Failed to purge past concerts"),
        }
        Ok(self.concerts.list_upcoming(today, tag).await?)
    }

    pub async fn user_concerts(&self, username: &str) -> Result<Vec<Concert>> {
        Ok(self.concerts.list_by_user(username).await?)
    }

    // ---------------------------------------------------------------------
    // Profile
    // ---------------------------------------------------------------------

    pub async fn user_stats(&self, username: &str) -> Result<UserStats> {
        Ok(UserStats {
            albums_posted: self.albums.count_by_user(username).await?,
            likes_received: self.albums.likes_received(username).await?,
            concerts: self.concerts.count_by_user(username).await?,
        })
    }

    // ---------------------------------------------------------------------
    // Discovery
    // ---------------------------------------------------------------------

    /// Run a random discovery from a random wall album. Signed-in users get
    /// the result saved to their history.
    pub async fn discover<R: Rng + Send>(
        &self,
        session: Option<&SessionContext>,
        rng: &mut R,
    ) -> Result<DiscoveryOutcome> {
        let discovery = self.discovery_service()?;
        let outcome = discovery.discover(None, rng).await?;
        self.record_discovery(session, &outcome).await;
        Ok(outcome)
    }

    /// Run a discovery seeded with a specific wall album.
    pub async fn discover_from<R: Rng + Send>(
        &self,
        session: Option<&SessionContext>,
        album_id: &str,
        rng: &mut R,
    ) -> Result<DiscoveryOutcome> {
        let discovery = self.discovery_service()?;
        let album = self.albums.find_by_id(album_id).await?.ok_or_else(|| {
            LibraryError::NotFound {
                entity_type: "Album".to_string(),
                id: album_id.to_string(),
            }
        })?;

        let outcome = discovery
            .discover(Some(seed_from_album(&album)), rng)
            .await?;
        self.record_discovery(session, &outcome).await;
        Ok(outcome)
    }

    /// A user's saved discoveries, most recent first.
    pub async fn discoveries(&self, session: &SessionContext, limit: u32) -> Result<Vec<Discovery>> {
        Ok(self
            .discoveries
            .list_by_user(&session.username, limit)
            .await?)
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn discovery_service(&self) -> Result<&DiscoveryService> {
        self.discovery
            .as_deref()
            .ok_or_else(|| CoreError::NotConfigured("Spotify".to_string()))
    }

    /// Save the outcome to the user's history. A failed save is logged and
    /// does not take the discovery away from the caller.
    async fn record_discovery(&self, session: Option<&SessionContext>, outcome: &DiscoveryOutcome) {
        let Some(session) = session else {
            return;
        };

        let link = outcome
            .store_link
            .as_ref()
            .map(|l| l.url.clone())
            .unwrap_or_else(|| outcome.album.url.clone());
        let cover = outcome
            .album
            .image
            .clone()
            .or_else(|| outcome.store_link.as_ref().and_then(|l| l.cover_url.clone()));

        let record = Discovery::new(
            session.username.clone(),
            outcome.base_artist.clone(),
            outcome.seed.album_name.clone(),
            outcome.album.artist.clone(),
            outcome.album.album.clone(),
        )
        .with_links(Some(link), cover);

        match self.discoveries.insert(&record).await {
            Ok(()) => info!(discovery_id = %record.id, "Discovery saved"),
            Err(e) => warn!(username = %session.username, error = %e, "Failed to save discovery"),
        }
    }

    async fn ensure_url_available(&self, url: &str) -> Result<()> {
        if self.albums.exists_by_url(url).await? {
            return Err(LibraryError::DuplicateUrl {
                url: url.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn owned_album(&self, session: &SessionContext, album_id: &str) -> Result<Album> {
        let album = self
            .albums
            .find_by_id(album_id)
            .await?
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: "Album".to_string(),
                id: album_id.to_string(),
            })?;
        if !session.is_owner(&album.username) {
            return Err(CoreError::Forbidden(
                "only the user who posted an album can change it".to_string(),
            ));
        }
        Ok(album)
    }

    async fn owned_concert(&self, session: &SessionContext, concert_id: &str) -> Result<Concert> {
        let concert = self
            .concerts
            .find_by_id(concert_id)
            .await?
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: "Concert".to_string(),
                id: concert_id.to_string(),
            })?;
        if !session.is_owner(&concert.username) {
            return Err(CoreError::Forbidden(
                "only the user who added a concert can change it".to_string(),
            ));
        }
        Ok(concert)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn require(field: &str, value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(field, message));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
