//! Discovery seeds drawn from the wall.

use async_trait::async_trait;
use core_discovery::{DiscoveryError, SeedAlbum, SeedSource};
use core_wall::{Album, AlbumRepository};
use std::sync::Arc;

/// Picks a random posted album as the starting point of a discovery.
pub struct WallSeedSource {
    albums: Arc<dyn AlbumRepository>,
}

impl WallSeedSource {
    pub fn new(albums: Arc<dyn AlbumRepository>) -> Self {
        Self { albums }
    }
}

#[async_trait]
impl SeedSource for WallSeedSource {
    async fn random_seed(&self) -> core_discovery::Result<Option<SeedAlbum>> {
        let album = self
            .albums
            .random()
            .await
            .map_err(|e| DiscoveryError::Seed(e.to_string()))?;
        Ok(album.map(|a| seed_from_album(&a)))
    }
}

pub(crate) fn seed_from_album(album: &Album) -> SeedAlbum {
    SeedAlbum {
        id: Some(album.id.clone()),
        artist: album.artist.clone(),
        album_name: album.album_name.clone(),
        url: Some(album.url.clone()),
    }
}
