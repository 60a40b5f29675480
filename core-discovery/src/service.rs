//! Random discovery
//!
//! Walks from a seed album on the wall to a release by a related artist:
//!
//! 1. Clean the seed artist name
//! 2. Collect related artists (Spotify, then Last.fm similar artists)
//! 3. Pick a related artist at random and a random release of theirs
//! 4. Reject the release unless its artist is the one that was asked for
//! 5. Reject it unless its tags say metal
//! 6. Build discovery tags and look for a Bandcamp page
//!
//! Steps 3 to 5 repeat until a release passes or the attempt budget runs
//! out. Randomness is passed in so runs can be reproduced.

use crate::error::{DiscoveryError, Result};
use crate::genre::{classify, is_metal, is_metalish_tag};
use crate::normalize::{clean_artist_name, normalize_artist_name, similarity, IdentityMatch};
use crate::seams::{CatalogProvider, SeedAlbum, SeedSource, StoreLinkProvider, TagProvider};
use core_metadata::providers::spotify::pick_album;
use core_metadata::providers::{CatalogAlbum, SpotifyArtist, StoreLink};
use core_metadata::MetadataError;
use core_runtime::config::DiscoveryConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tag added to every discovery.
pub const DISCOVERY_TAG: &str = "randomdiscovery";

/// Discovery tags carried per result, including [`DISCOVERY_TAG`].
pub const MAX_DISCOVERY_TAGS: usize = 5;

const SIMILAR_ARTIST_LIMIT: u32 = 20;
const TAG_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub max_attempts: u32,
    pub identity: IdentityMatch,
    pub bandcamp_lookup: bool,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::from(&DiscoveryConfig::default())
    }
}

impl From<&DiscoveryConfig> for DiscoverySettings {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            identity: config.identity_match.into(),
            bandcamp_lookup: config.bandcamp_lookup,
        }
    }
}

/// How a discovered release was confirmed to be metal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validation {
    /// Last.fm album or artist tags
    Tags,
    /// Spotify artist genres only
    GenresOnly,
}

impl Validation {
    pub fn label(&self) -> &'static str {
        match self {
            Validation::Tags => "Validated as metal",
            Validation::GenresOnly => "Could not validate (Last.fm not available)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    pub seed: SeedAlbum,
    /// Seed artist after cleaning.
    pub base_artist: String,
    /// Related artist the release was requested for.
    pub related_artist: String,
    pub album: CatalogAlbum,
    pub store_link: Option<StoreLink>,
    pub tags: Vec<String>,
    pub validation: Validation,
    pub description: String,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
struct RelatedArtist {
    name: String,
    resolved: Option<SpotifyArtist>,
}

pub struct DiscoveryService {
    catalog: Arc<dyn CatalogProvider>,
    seeds: Arc<dyn SeedSource>,
    tags: Option<Arc<dyn TagProvider>>,
    store: Option<Arc<dyn StoreLinkProvider>>,
    settings: DiscoverySettings,
}

impl DiscoveryService {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        seeds: Arc<dyn SeedSource>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            catalog,
            seeds,
            tags: None,
            store: None,
            settings,
        }
    }

    pub fn with_tag_provider(mut self, tags: Arc<dyn TagProvider>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_store_links(mut self, store: Arc<dyn StoreLinkProvider>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Find a metal release related to `seed`, or to a random wall album
    /// when no seed is given.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::EmptyWall`] - no seed given and the wall is empty
    /// - [`DiscoveryError::MissingArtist`] - the seed has no usable artist
    /// - [`DiscoveryError::NoRelatedArtists`] - neither catalog knows related artists
    /// - [`DiscoveryError::Exhausted`] - no candidate passed validation
    #[instrument(skip(self, rng))]
    pub async fn discover<R: Rng + Send>(
        &self,
        seed: Option<SeedAlbum>,
        rng: &mut R,
    ) -> Result<DiscoveryOutcome> {
        let seed = match seed {
            Some(seed) => seed,
            None => self
                .seeds
                .random_seed()
                .await?
                .ok_or(DiscoveryError::EmptyWall)?,
        };

        let base_artist = clean_artist_name(&seed.artist);
        if base_artist.is_empty() {
            return Err(DiscoveryError::MissingArtist);
        }

        let related = self.related_artists(&base_artist).await?;
        info!(
            base_artist = %base_artist,
            related = related.len(),
            "Collected related artists"
        );

        for attempt in 1..=self.settings.max_attempts {
            let Some(candidate) = related.choose(&mut *rng).cloned() else {
                break;
            };

            let artist = match candidate.resolved {
                Some(artist) => artist,
                None => match self.resolve_artist(&candidate.name).await {
                    Ok(Some(artist)) => artist,
                    Ok(None) => {
                        debug!(attempt, artist = %candidate.name, "No catalog entry for related artist");
                        continue;
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Artist lookup failed");
                        continue;
                    }
                },
            };

            let albums = match self.catalog.artist_albums(&artist.id).await {
                Ok(albums) => albums,
                Err(e) => {
                    warn!(attempt, error = %e, "Album lookup failed");
                    continue;
                }
            };
            let Some(mut album) = pick_album(&albums, &mut *rng).cloned() else {
                debug!(attempt, artist = %artist.name, "Artist has no releases");
                continue;
            };
            if album.artist.is_empty() {
                album.artist = artist.name.clone();
            }
            if album.genres.is_empty() {
                album.genres = artist.genres.clone();
            }

            if !self.settings.identity.matches(&candidate.name, &album.artist) {
                info!(
                    attempt,
                    requested = %candidate.name,
                    returned = %album.artist,
                    "Rejected release: artist mismatch"
                );
                continue;
            }

            let Some((validation, validated_tags)) =
                self.validate_genre(&album, &candidate.name).await
            else {
                info!(attempt, album = %album.album, "Rejected release: not metal");
                continue;
            };

            let tags = self.discovery_tags(&album, &validated_tags).await;
            let store_link = self.find_store_link(&album).await;

            info!(
                attempt,
                artist = %album.artist,
                album = %album.album,
                "Discovered release"
            );

            return Ok(DiscoveryOutcome {
                description: format!(
                    "Based on '{}' by {} → Related artist: {}",
                    seed.album_name, base_artist, candidate.name
                ),
                seed,
                base_artist,
                related_artist: candidate.name,
                album,
                store_link,
                tags,
                validation,
                attempts: attempt,
            });
        }

        Err(DiscoveryError::Exhausted(self.settings.max_attempts))
    }

    /// Spotify related artists of the seed, else Last.fm similar artists.
    async fn related_artists(&self, base_artist: &str) -> Result<Vec<RelatedArtist>> {
        let mut last_error: Option<MetadataError> = None;

        let spotify = match self.resolve_artist(base_artist).await {
            Ok(Some(seed_artist)) => self.catalog.related_artists(&seed_artist.id).await,
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };
        let mut related: Vec<RelatedArtist> = match spotify {
            Ok(artists) => artists
                .into_iter()
                .map(|artist| RelatedArtist {
                    name: artist.name.clone(),
                    resolved: Some(artist),
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Spotify related artists failed");
                last_error = Some(e);
                Vec::new()
            }
        };

        if related.is_empty() {
            if let Some(tags) = &self.tags {
                match tags.similar_artists(base_artist, SIMILAR_ARTIST_LIMIT).await {
                    Ok(names) => {
                        related = names
                            .into_iter()
                            .map(|name| RelatedArtist { name, resolved: None })
                            .collect();
                    }
                    Err(e) => {
                        warn!(error = %e, "Last.fm similar artists failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        if related.is_empty() {
            return Err(match last_error {
                Some(e) => e.into(),
                None => DiscoveryError::NoRelatedArtists(base_artist.to_string()),
            });
        }
        Ok(related)
    }

    /// Catalog entry for an artist name under the identity rule.
    async fn resolve_artist(
        &self,
        name: &str,
    ) -> std::result::Result<Option<SpotifyArtist>, MetadataError> {
        let mut found = self
            .catalog
            .search_artists(&format!("artist:\"{}\"", name.trim()), 5)
            .await?;
        if found.is_empty() {
            found = self.catalog.search_artists(name.trim(), 10).await?;
        }

        let target = normalize_artist_name(name);
        if let Some(exact) = found
            .iter()
            .find(|a| normalize_artist_name(&a.name) == target)
        {
            return Ok(Some(exact.clone()));
        }

        match self.settings.identity {
            IdentityMatch::Exact => Ok(None),
            IdentityMatch::Fuzzy { threshold } => Ok(found
                .into_iter()
                .map(|a| (similarity(&target, &normalize_artist_name(&a.name)), a))
                .filter(|(score, _)| *score >= threshold)
                .max_by(|(x, _), (y, _)| x.total_cmp(y))
                .map(|(_, a)| a)),
        }
    }

    /// Tags that confirmed the release as metal, or `None` to reject it.
    async fn validate_genre(
        &self,
        album: &CatalogAlbum,
        requested: &str,
    ) -> Option<(Validation, Vec<String>)> {
        let Some(tags) = &self.tags else {
            return is_metal(&album.genres).then(|| (Validation::GenresOnly, album.genres.clone()));
        };

        let album_tags = tags
            .album_tags(&album.artist, &album.album, TAG_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Album tag lookup failed");
                Vec::new()
            });
        if is_metal(&album_tags) {
            return Some((Validation::Tags, album_tags));
        }

        // Last.fm may spell the artist differently; only accept a spelling
        // that still names the requested artist.
        let tag_artist = match tags.search_album(&album.album, &album.artist).await {
            Ok(Some(found)) if self.settings.identity.matches(requested, &found.artist) => {
                found.artist
            }
            Ok(_) => album.artist.clone(),
            Err(e) => {
                warn!(error = %e, "Album search failed");
                album.artist.clone()
            }
        };

        let artist_tags = tags
            .artist_tags(&tag_artist, TAG_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Artist tag lookup failed");
                Vec::new()
            });
        let verdict = classify(&artist_tags);
        debug!(metal = verdict.metal, blacklisted = verdict.blacklisted, "Artist tag verdict");
        if verdict.is_metal() {
            let mut combined = artist_tags;
            for tag in album_tags {
                if !combined.contains(&tag) {
                    combined.push(tag);
                }
            }
            return Some((Validation::Tags, combined));
        }

        // Nothing on Last.fm at all: fall back to catalog genres.
        if album_tags.is_empty() && artist_tags.is_empty() && is_metal(&album.genres) {
            return Some((Validation::GenresOnly, album.genres.clone()));
        }

        None
    }

    async fn discovery_tags(&self, album: &CatalogAlbum, validated: &[String]) -> Vec<String> {
        let room = MAX_DISCOVERY_TAGS - 1;
        let mut tags: Vec<String> = Vec::with_capacity(MAX_DISCOVERY_TAGS);

        let push = |tags: &mut Vec<String>, raw: &str| {
            let tag = clean_tag(raw);
            if !tag.is_empty() && tag != DISCOVERY_TAG && !tags.contains(&tag) && tags.len() < room {
                tags.push(tag);
            }
        };

        for tag in validated.iter().take(MAX_DISCOVERY_TAGS) {
            push(&mut tags, tag);
        }
        for genre in album.genres.iter().take(3) {
            push(&mut tags, genre);
        }

        if tags.len() < room {
            if let Some(provider) = &self.tags {
                match provider.artist_tags(&album.artist, MAX_DISCOVERY_TAGS).await {
                    Ok(artist_tags) => {
                        for tag in artist_tags.iter().filter(|t| is_metalish_tag(t)) {
                            push(&mut tags, tag);
                        }
                    }
                    Err(e) => debug!(error = %e, "Skipping artist tags"),
                }
            }
        }

        tags.push(DISCOVERY_TAG.to_string());
        tags
    }

    async fn find_store_link(&self, album: &CatalogAlbum) -> Option<StoreLink> {
        if !self.settings.bandcamp_lookup {
            return None;
        }
        let store = self.store.as_ref()?;

        match store.find_album(&album.artist, &album.album).await {
            Ok(link) => link,
            Err(e) => {
                warn!(error = %e, "Bandcamp lookup failed");
                None
            }
        }
    }
}

/// Lowercase, keeping only characters valid in wall tags.
pub fn clean_tag(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seams::{MockCatalogProvider, MockSeedSource, MockStoreLinkProvider, MockTagProvider};
    use core_metadata::providers::LastFmAlbumMatch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn artist(id: &str, name: &str, genres: &[&str]) -> SpotifyArtist {
        SpotifyArtist {
            id: id.to_string(),
            name: name.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            popularity: 40,
            url: None,
        }
    }

    fn release(artist_id: &str, artist: &str, title: &str) -> CatalogAlbum {
        CatalogAlbum {
            id: format!("{}-{}", artist_id, title.len()),
            artist: artist.to_string(),
            artist_id: artist_id.to_string(),
            album: title.to_string(),
            url: format!("https://open.spotify.com/album/{}", artist_id),
            image: Some("https://i.scdn.co/image/x".to_string()),
            release_date: None,
            album_type: "album".to_string(),
            genres: Vec::new(),
        }
    }

    fn settings(max_attempts: u32) -> DiscoverySettings {
        DiscoverySettings {
            max_attempts,
            identity: IdentityMatch::Exact,
            bandcamp_lookup: true,
        }
    }

    fn no_seeds() -> Arc<dyn SeedSource> {
        let mut seeds = MockSeedSource::new();
        seeds.expect_random_seed().never();
        Arc::new(seeds)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Catalog where the seed "Dissection" relates to a single artist.
    fn catalog_with_related(related: SpotifyArtist, albums: Vec<CatalogAlbum>) -> MockCatalogProvider {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_search_artists()
            .returning(|query, _| {
                if query.contains("Dissection") {
                    Ok(vec![artist("d1", "Dissection", &["black metal"])])
                } else {
                    Ok(Vec::new())
                }
            });
        catalog
            .expect_related_artists()
            .returning(move |_| Ok(vec![related.clone()]));
        catalog
            .expect_artist_albums()
            .returning(move |_| Ok(albums.clone()));
        catalog
    }

    #[test]
    fn test_clean_tag() {
        assert_eq!(clean_tag("Black Metal"), "blackmetal");
        assert_eq!(clean_tag("post-metal"), "postmetal");
        assert_eq!(clean_tag("  "), "");
    }

    #[test]
    fn test_validation_labels() {
        assert_eq!(Validation::Tags.label(), "Validated as metal");
        assert!(Validation::GenresOnly.label().contains("Last.fm"));
    }

    #[tokio::test]
    async fn test_discovers_validated_release() {
        let catalog = catalog_with_related(
            artist("n1", "Necrophobic", &["swedish black metal"]),
            vec![release("n1", "Necrophobic", "The Nocturnal Silence")],
        );

        let mut tags = MockTagProvider::new();
        tags.expect_album_tags()
            .returning(|_, _, _| Ok(vec!["black metal".to_string(), "swedish".to_string()]));
        tags.expect_artist_tags().returning(|_, _| {
            Ok(vec![
                "death metal".to_string(),
                "seen live".to_string(),
                "blackened death metal".to_string(),
            ])
        });
        tags.expect_similar_artists().never();

        let mut store = MockStoreLinkProvider::new();
        store.expect_find_album().times(1).returning(|artist, album| {
            Ok(Some(StoreLink {
                url: "https://necrophobic.bandcamp.com/album/x".to_string(),
                artist: artist.to_string(),
                album: album.to_string(),
                cover_url: None,
            }))
        });

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(5))
            .with_tag_provider(Arc::new(tags))
            .with_store_links(Arc::new(store));

        let seed = SeedAlbum::new("Dissection | Bandcamp", "Storm of the Light's Bane");
        let outcome = service.discover(Some(seed), &mut rng()).await.unwrap();

        assert_eq!(outcome.base_artist, "Dissection");
        assert_eq!(outcome.related_artist, "Necrophobic");
        assert_eq!(outcome.album.artist, "Necrophobic");
        assert_eq!(outcome.album.genres, vec!["swedish black metal"]);
        assert_eq!(outcome.validation, Validation::Tags);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.store_link.is_some());
        assert_eq!(
            outcome.description,
            "Based on 'Storm of the Light's Bane' by Dissection → Related artist: Necrophobic"
        );

        assert!(outcome.tags.len() <= MAX_DISCOVERY_TAGS);
        assert_eq!(outcome.tags[0], "blackmetal");
        assert!(outcome.tags.contains(&"swedishblackmetal".to_string()));
        assert_eq!(outcome.tags.last().map(String::as_str), Some(DISCOVERY_TAG));
    }

    #[tokio::test]
    async fn test_identity_mismatch_is_never_returned() {
        let catalog = catalog_with_related(
            artist("n1", "Necrophobic", &["black metal"]),
            vec![release("n1", "Necrophobic Tribute Ensemble", "Covers")],
        );

        let mut tags = MockTagProvider::new();
        tags.expect_album_tags().never();
        tags.expect_artist_tags().never();

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(3))
            .with_tag_provider(Arc::new(tags));

        let err = service
            .discover(Some(SeedAlbum::new("Dissection", "Reinkaos")), &mut rng())
            .await
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::Exhausted(3)));
        assert_eq!(
            err.to_string(),
            "Could not find a valid metal album after 3 attempts. Try again!"
        );
    }

    #[tokio::test]
    async fn test_fuzzy_identity_accepts_close_names() {
        let catalog = catalog_with_related(
            artist("n1", "Necrophobic", &["black metal"]),
            vec![release("n1", "Necrophobic (SWE)", "Darkside")],
        );

        let service = DiscoveryService::new(
            Arc::new(catalog),
            no_seeds(),
            DiscoverySettings {
                max_attempts: 2,
                identity: IdentityMatch::Fuzzy { threshold: 0.7 },
                bandcamp_lookup: false,
            },
        );

        let outcome = service
            .discover(Some(SeedAlbum::new("Dissection", "Reinkaos")), &mut rng())
            .await
            .unwrap();

        assert_eq!(outcome.album.artist, "Necrophobic (SWE)");
        assert_eq!(outcome.validation, Validation::GenresOnly);
        assert!(outcome.store_link.is_none());
    }

    #[tokio::test]
    async fn test_non_metal_release_rejected() {
        let catalog = catalog_with_related(
            artist("p1", "Poppy", &["pop", "dance pop"]),
            vec![release("p1", "Poppy", "Am I a Girl?")],
        );

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(2));

        let err = service
            .discover(Some(SeedAlbum::new("Dissection", "Reinkaos")), &mut rng())
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Exhausted(2)));
    }

    #[tokio::test]
    async fn test_lastfm_corrected_artist_tags() {
        let catalog = catalog_with_related(
            artist("n1", "Necrophobic", &[]),
            vec![release("n1", "Necrophobic", "Mark of the Necrogram")],
        );

        let mut tags = MockTagProvider::new();
        tags.expect_album_tags().returning(|_, _, _| Ok(Vec::new()));
        tags.expect_search_album().times(1).returning(|album, _| {
            Ok(Some(LastFmAlbumMatch {
                artist: "NECROPHOBIC".to_string(),
                album: album.to_string(),
                url: None,
            }))
        });
        tags.expect_artist_tags()
            .withf(|artist, _| artist.starts_with("NECRO"))
            .returning(|_, _| Ok(vec!["black metal".to_string(), "thrash".to_string()]));
        tags.expect_artist_tags()
            .withf(|artist, _| !artist.starts_with("NECRO"))
            .returning(|_, _| Ok(vec!["black metal".to_string()]));

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(1))
            .with_tag_provider(Arc::new(tags));

        let outcome = service
            .discover(Some(SeedAlbum::new("Dissection", "Reinkaos")), &mut rng())
            .await
            .unwrap();

        assert_eq!(outcome.validation, Validation::Tags);
        assert_eq!(outcome.tags, vec!["blackmetal", "thrash", DISCOVERY_TAG]);
    }

    #[tokio::test]
    async fn test_falls_back_to_similar_artists() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_search_artists().returning(|query, _| {
            if query.contains("Watain") {
                Ok(vec![artist("w1", "Watain", &["black metal"])])
            } else {
                Ok(Vec::new())
            }
        });
        catalog.expect_related_artists().never();
        catalog
            .expect_artist_albums()
            .returning(|_| Ok(vec![release("w1", "Watain", "Lawless Darkness")]));

        let mut tags = MockTagProvider::new();
        tags.expect_similar_artists()
            .times(1)
            .returning(|_, _| Ok(vec!["Watain".to_string()]));
        tags.expect_album_tags().returning(|_, _, _| Ok(Vec::new()));
        tags.expect_search_album().returning(|_, _| Ok(None));
        tags.expect_artist_tags().returning(|_, _| Ok(Vec::new()));

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(1))
            .with_tag_provider(Arc::new(tags));

        let outcome = service
            .discover(Some(SeedAlbum::new("Unknown Band", "Demo")), &mut rng())
            .await
            .unwrap();

        assert_eq!(outcome.album.album, "Lawless Darkness");
        assert_eq!(outcome.validation, Validation::GenresOnly);
    }

    #[tokio::test]
    async fn test_no_related_artists() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_search_artists().returning(|_, _| Ok(Vec::new()));

        let mut tags = MockTagProvider::new();
        tags.expect_similar_artists().returning(|_, _| Ok(Vec::new()));

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(3))
            .with_tag_provider(Arc::new(tags));

        let err = service
            .discover(Some(SeedAlbum::new("Obscure Act", "Tape")), &mut rng())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No related artists found for Obscure Act");
    }

    #[tokio::test]
    async fn test_provider_error_surfaces_when_nothing_found() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_search_artists().returning(|_, _| {
            Err(MetadataError::RateLimited {
                provider: "Spotify".to_string(),
                retry_after_seconds: 30,
            })
        });

        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(3));

        let err = service
            .discover(Some(SeedAlbum::new("Dissection", "Reinkaos")), &mut rng())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Metadata(MetadataError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_seed_artist() {
        let catalog = MockCatalogProvider::new();
        let service = DiscoveryService::new(Arc::new(catalog), no_seeds(), settings(3));

        let err = service
            .discover(Some(SeedAlbum::new("Unknown Artist", "x")), &mut rng())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not extract artist from album");
    }

    #[tokio::test]
    async fn test_empty_wall() {
        let mut seeds = MockSeedSource::new();
        seeds.expect_random_seed().times(1).returning(|| Ok(None));

        let service = DiscoveryService::new(
            Arc::new(MockCatalogProvider::new()),
            Arc::new(seeds),
            settings(3),
        );

        let err = service.discover(None, &mut rng()).await.unwrap_err();
        assert_eq!(err.to_string(), "No albums found in the wall");
    }
}
