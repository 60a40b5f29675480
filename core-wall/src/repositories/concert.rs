//! Concert repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Concert, ConcertRow, LikeState};
use crate::repositories::normalize_filter;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{query, query_as, SqlitePool};
use tracing::{debug, info};

const CONCERT_SELECT: &str = r#"
    SELECT c.id, c.username, c.bands, c.date, c.venue, c.city, c.tags, c.info,
           c.created_at,
           (SELECT json_group_array(username)
              FROM concert_likes WHERE concert_id = c.id) AS likers
    FROM concerts c
"#;

#[async_trait]
pub trait ConcertRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Concert>>;

    async fn insert(&self, concert: &Concert) -> Result<()>;

    /// Update bands, date, venue, city, tags and info
    async fn update(&self, concert: &Concert) -> Result<()>;

    /// Delete a concert with its likes. `Ok(false)` when it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Concerts on or after `today`, soonest first, optionally restricted to a tag
    async fn list_upcoming(&self, today: NaiveDate, tag: Option<&str>) -> Result<Vec<Concert>>;

    /// Concerts announced by a user, soonest first
    async fn list_by_user(&self, username: &str) -> Result<Vec<Concert>>;

    /// Like the concert if `username` has not liked it yet, unlike it otherwise
    async fn toggle_like(&self, concert_id: &str, username: &str) -> Result<LikeState>;

    /// Delete every concert dated strictly before `date`. Returns how many.
    async fn purge_before(&self, date: NaiveDate) -> Result<u64>;

    async fn count_by_user(&self, username: &str) -> Result<i64>;
}

pub struct SqliteConcertRepository {
    pool: SqlitePool,
}

impl SqliteConcertRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn rows_to_concerts(rows: Vec<ConcertRow>) -> Result<Vec<Concert>> {
        rows.into_iter().map(Concert::try_from).collect()
    }
}

#[async_trait]
impl ConcertRepository for SqliteConcertRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Concert>> {
        let row = query_as::<_, ConcertRow>(&format!("{} WHERE c.id = ?", CONCERT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Concert::try_from).transpose()
    }

    async fn insert(&self, concert: &Concert) -> Result<()> {
        concert
            .validate()
            .map_err(|e| LibraryError::invalid("Concert", e))?;

        query(
            r#"
            INSERT INTO concerts (
                id, username, bands, date, venue, city, tags, info, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&concert.id)
        .bind(&concert.username)
        .bind(concert.bands.trim())
        .bind(concert.date)
        .bind(concert.venue.trim())
        .bind(concert.city.trim())
        .bind(concert.tags.to_json())
        .bind(&concert.info)
        .bind(concert.created_at)
        .execute(&self.pool)
        .await?;

        debug!(concert_id = %concert.id, date = %concert.date, "Inserted concert");
        Ok(())
    }

    async fn update(&self, concert: &Concert) -> Result<()> {
        concert
            .validate()
            .map_err(|e| LibraryError::invalid("Concert", e))?;

        let result = query(
            r#"
            UPDATE concerts
            SET bands = ?, date = ?, venue = ?, city = ?, tags = ?, info = ?
            WHERE id = ?
            "#,
        )
        .bind(concert.bands.trim())
        .bind(concert.date)
        .bind(concert.venue.trim())
        .bind(concert.city.trim())
        .bind(concert.tags.to_json())
        .bind(&concert.info)
        .bind(&concert.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Concert", &concert.id));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM concerts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_upcoming(&self, today: NaiveDate, tag: Option<&str>) -> Result<Vec<Concert>> {
        let tag = normalize_filter(tag);

        let rows = query_as::<_, ConcertRow>(&format!(
            r#"{}
            WHERE c.date >= ?1
              AND (?2 IS NULL OR EXISTS (SELECT 1 FROM json_each(c.tags) WHERE json_each.value = ?2))
            ORDER BY c.date ASC, c.created_at ASC"#,
            CONCERT_SELECT
        ))
        .bind(today)
        .bind(&tag)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_concerts(rows)
    }

    async fn list_by_user(&self, username: &str) -> Result<Vec<Concert>> {
        let rows = query_as::<_, ConcertRow>(&format!(
            "{} WHERE c.username = ? ORDER BY c.date ASC, c.created_at ASC",
            CONCERT_SELECT
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_concerts(rows)
    }

    async fn toggle_like(&self, concert_id: &str, username: &str) -> Result<LikeState> {
        // Write first: the write lock must be held before any read.
        let mut tx = self.pool.begin().await?;

        let removed = query("DELETE FROM concert_likes WHERE concert_id = ? AND username = ?")
            .bind(concert_id)
            .bind(username)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            let inserted = query(
                "INSERT INTO concert_likes (concert_id, username, created_at)
                 SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM concerts WHERE id = ?)",
            )
            .bind(concert_id)
            .bind(username)
            .bind(chrono::Utc::now().timestamp())
            .bind(concert_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if inserted == 0 {
                return Err(LibraryError::not_found("Concert", concert_id));
            }
        }

        let (count,): (i64,) =
            query_as("SELECT COUNT(*) FROM concert_likes WHERE concert_id = ?")
                .bind(concert_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(LikeState {
            liked: !removed,
            count,
        })
    }

    async fn purge_before(&self, date: NaiveDate) -> Result<u64> {
        let result = query("DELETE FROM concerts WHERE date < ?")
            .bind(date)
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(purged, before = %date, "Purged past concerts");
        }
        Ok(purged)
    }

    async fn count_by_user(&self, username: &str) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM concerts WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}
