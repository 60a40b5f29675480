//! Discovery history repository

use crate::error::{LibraryError, Result};
use crate::models::Discovery;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait DiscoveryRepository: Send + Sync {
    async fn insert(&self, discovery: &Discovery) -> Result<()>;

    /// Most recent discoveries of a user first
    async fn list_by_user(&self, username: &str, limit: u32) -> Result<Vec<Discovery>>;
}

pub struct SqliteDiscoveryRepository {
    pool: SqlitePool,
}

impl SqliteDiscoveryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscoveryRepository for SqliteDiscoveryRepository {
    async fn insert(&self, discovery: &Discovery) -> Result<()> {
        if discovery.username.trim().is_empty() {
            return Err(LibraryError::invalid(
                "Discovery",
                "Discovery owner cannot be empty",
            ));
        }

        query(
            r#"
            INSERT INTO discoveries (
                id, username, base_artist, base_album, discovered_artist,
                discovered_album, discovered_url, cover_url, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&discovery.id)
        .bind(&discovery.username)
        .bind(&discovery.base_artist)
        .bind(&discovery.base_album)
        .bind(&discovery.discovered_artist)
        .bind(&discovery.discovered_album)
        .bind(&discovery.discovered_url)
        .bind(&discovery.cover_url)
        .bind(discovery.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_user(&self, username: &str, limit: u32) -> Result<Vec<Discovery>> {
        let discoveries = query_as::<_, Discovery>(
            r#"
            SELECT * FROM discoveries
            WHERE username = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(username)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(discoveries)
    }
}
