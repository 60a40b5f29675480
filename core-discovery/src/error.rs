use core_metadata::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("No albums found in the wall")]
    EmptyWall,

    #[error("Could not extract artist from album")]
    MissingArtist,

    #[error("No related artists found for {0}")]
    NoRelatedArtists(String),

    #[error("Could not find a valid metal album after {0} attempts. Try again!")]
    Exhausted(u32),

    #[error("Failed to pick a seed album: {0}")]
    Seed(String),

    #[error("Catalog error: {0}")]
    Metadata(#[from] MetadataError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
