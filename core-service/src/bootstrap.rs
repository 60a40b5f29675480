//! Wiring from configuration to a ready [`WallService`].

use crate::error::{CoreError, Result};
use crate::seed::WallSeedSource;
use crate::wall::WallService;
use bridge_native::ReqwestHttpClient;
use bridge_traits::http::HttpClient;
use core_discovery::{DiscoveryService, DiscoverySettings};
use core_metadata::providers::{BandcampSearch, LastFmClient, SpotifyClient};
use core_metadata::MetadataExtractor;
use core_runtime::config::AppConfig;
use core_wall::db::{create_pool, DatabaseConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Open the database, build the HTTP stack and the catalog clients.
///
/// Discovery is only wired when Spotify credentials are configured; Last.fm
/// validation is added when an API key is present.
pub async fn bootstrap(config: &AppConfig) -> Result<WallService> {
    let pool = create_pool(DatabaseConfig::new(config.database_path.clone())).await?;

    let http: Arc<dyn HttpClient> = Arc::new(
        ReqwestHttpClient::new()
            .map_err(|e| CoreError::InitializationFailed(format!("HTTP client: {}", e)))?,
    );

    let service = WallService::new(pool).with_extractor(MetadataExtractor::new(Arc::clone(&http)));

    match build_discovery(config, http, service.albums()) {
        Some(discovery) => Ok(service.with_discovery(discovery)),
        None => Ok(service),
    }
}

/// Discovery over the configured catalogs, or `None` without Spotify.
pub fn build_discovery(
    config: &AppConfig,
    http: Arc<dyn HttpClient>,
    albums: Arc<dyn core_wall::AlbumRepository>,
) -> Option<DiscoveryService> {
    let api = &config.metadata_api;
    let (Some(client_id), Some(client_secret)) =
        (api.spotify_client_id.clone(), api.spotify_client_secret.clone())
    else {
        warn!("Spotify credentials missing; random discovery disabled");
        return None;
    };

    let spotify = SpotifyClient::new(
        Arc::clone(&http),
        client_id,
        client_secret,
        api.rate_limit_delay_ms,
    );
    let seeds = WallSeedSource::new(albums);
    let settings = DiscoverySettings::from(&config.discovery);

    let mut discovery = DiscoveryService::new(Arc::new(spotify), Arc::new(seeds), settings);

    if let Some(api_key) = api.lastfm_api_key.clone() {
        discovery = discovery.with_tag_provider(Arc::new(LastFmClient::new(
            Arc::clone(&http),
            api_key,
            api.rate_limit_delay_ms,
        )));
    } else {
        info!("No Last.fm API key; genre validation uses Spotify genres only");
    }

    if config.discovery.bandcamp_lookup {
        discovery = discovery.with_store_links(Arc::new(BandcampSearch::new(
            http,
            api.rate_limit_delay_ms,
        )));
    }

    Some(discovery)
}
