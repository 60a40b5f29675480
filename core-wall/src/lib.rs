//! # Wall Storage Module
//!
//! Owns the Metal Wall database and provides repository patterns for data
//! access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - Repositories for albums, concerts and saved discoveries
//! - Likes stored in join tables, toggled transactionally
//! - Tag normalization (`#Black_Metal doom` → `["black_metal", "doom"]`)

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod tags;

pub use error::{LibraryError, Result};
pub use models::{Album, Concert, Discovery, LikeState};
pub use repositories::{
    AlbumRepository, ConcertRepository, DiscoveryRepository, Page, PageRequest,
    SqliteAlbumRepository, SqliteConcertRepository, SqliteDiscoveryRepository,
};
pub use tags::{process_tags, TagList};
