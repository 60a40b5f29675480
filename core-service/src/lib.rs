//! Core service façade and bootstrap helpers.
//!
//! [`WallService`] is what front ends talk to: posting and liking albums,
//! gigs, the feed and ranking, profile stats, and random discovery. It
//! composes the wall repositories, the metadata extractor and the
//! discovery loop. [`bootstrap`] builds one from an
//! [`AppConfig`](core_runtime::config::AppConfig).

pub mod bootstrap;
pub mod error;
pub mod seed;
pub mod wall;

pub use bootstrap::{bootstrap, build_discovery};
pub use error::{CoreError, Result};
pub use seed::WallSeedSource;
pub use wall::{AlbumDraft, ConcertDraft, UserStats, WallService};
