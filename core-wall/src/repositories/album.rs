//! Posted albums, their likes and the queries behind the feed and ranking.

use crate::error::{map_url_conflict, LibraryError, Result};
use crate::models::{Album, AlbumRow, LikeState};
use crate::repositories::{normalize_filter, Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// Columns of an album plus its likers as a JSON array
const ALBUM_SELECT: &str = r#"
    SELECT a.id, a.username, a.url, a.artist, a.album_name, a.cover_url,
           a.platform, a.tags, a.created_at,
           (SELECT json_group_array(username)
              FROM album_likes WHERE album_id = a.id) AS likers
    FROM albums a
"#;

const TAG_CLAUSE: &str =
    "(?1 IS NULL OR EXISTS (SELECT 1 FROM json_each(a.tags) WHERE json_each.value = ?1))";

/// Storage for the album wall.
///
/// Albums come back with their likers filled in. Tag filters are
/// normalized first, so `"#Doom"` and `"doom"` select the same posts.
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Album>>;

    /// Fails with `DuplicateUrl` when the link is already on the wall.
    async fn insert(&self, album: &Album) -> Result<()>;

    /// Rewrites the editable fields; likes are kept. `NotFound` for an
    /// unknown id, `DuplicateUrl` when the new link belongs to another post.
    async fn update(&self, album: &Album) -> Result<()>;

    /// `false` when there was nothing to delete. Likes go with the album.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Whether an album with this URL has already been posted
    async fn exists_by_url(&self, url: &str) -> Result<bool>;

    /// Feed: newest first, optionally restricted to a tag
    async fn list(&self, tag: Option<&str>, page_request: PageRequest) -> Result<Page<Album>>;

    /// Ranking: most liked first, optionally restricted to a tag
    async fn ranking(&self, tag: Option<&str>, limit: u32) -> Result<Vec<Album>>;

    /// Albums posted by a user, newest first
    async fn list_by_user(&self, username: &str, page_request: PageRequest)
        -> Result<Page<Album>>;

    /// A uniformly random album, if the wall is not empty
    async fn random(&self) -> Result<Option<Album>>;

    /// Like the album if `username` has not liked it yet, unlike it otherwise
    async fn toggle_like(&self, album_id: &str, username: &str) -> Result<LikeState>;

    /// Users who liked the album, oldest like first
    async fn likers(&self, album_id: &str) -> Result<Vec<String>>;

    /// Total likes received by all albums a user posted
    async fn likes_received(&self, username: &str) -> Result<i64>;

    /// Every tag in use, sorted
    async fn all_tags(&self) -> Result<Vec<String>>;

    async fn count_by_user(&self, username: &str) -> Result<i64>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn rows_to_albums(rows: Vec<AlbumRow>) -> Result<Vec<Album>> {
        rows.into_iter().map(Album::try_from).collect()
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Album>> {
        let row = query_as::<_, AlbumRow>(&format!("{} WHERE a.id = ?", ALBUM_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Album::try_from).transpose()
    }

    async fn insert(&self, album: &Album) -> Result<()> {
        album
            .validate()
            .map_err(|e| LibraryError::invalid("Album", e))?;

        query(
            r#"
            INSERT INTO albums (
                id, username, url, artist, album_name,
                cover_url, platform, tags, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&album.id)
        .bind(&album.username)
        .bind(album.url.trim())
        .bind(album.artist.trim())
        .bind(album.album_name.trim())
        .bind(&album.cover_url)
        .bind(&album.platform)
        .bind(album.tags.to_json())
        .bind(album.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_url_conflict(e, &album.url))?;

        debug!(album_id = %album.id, username = %album.username, "Inserted album");
        Ok(())
    }

    async fn update(&self, album: &Album) -> Result<()> {
        album
            .validate()
            .map_err(|e| LibraryError::invalid("Album", e))?;

        let result = query(
            r#"
            UPDATE albums
            SET url = ?, artist = ?, album_name = ?, cover_url = ?, platform = ?, tags = ?
            WHERE id = ?
            "#,
        )
        .bind(album.url.trim())
        .bind(album.artist.trim())
        .bind(album.album_name.trim())
        .bind(&album.cover_url)
        .bind(&album.platform)
        .bind(album.tags.to_json())
        .bind(&album.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_url_conflict(e, &album.url))?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Album", &album.id));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM albums WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let row: Option<(i64,)> = query_as("SELECT 1 FROM albums WHERE url = ? LIMIT 1")
            .bind(url.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn list(&self, tag: Option<&str>, page_request: PageRequest) -> Result<Page<Album>> {
        let tag = normalize_filter(tag);

        let total: i64 = query_as(&format!("SELECT COUNT(*) FROM albums a WHERE {}", TAG_CLAUSE))
            .bind(&tag)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        let rows = query_as::<_, AlbumRow>(&format!(
            "{} WHERE {} ORDER BY a.created_at DESC, a.rowid DESC LIMIT ?2 OFFSET ?3",
            ALBUM_SELECT, TAG_CLAUSE
        ))
        .bind(&tag)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(
            Self::rows_to_albums(rows)?,
            total as u64,
            page_request,
        ))
    }

    async fn ranking(&self, tag: Option<&str>, limit: u32) -> Result<Vec<Album>> {
        let tag = normalize_filter(tag);

        let rows = query_as::<_, AlbumRow>(&format!(
            r#"{} WHERE {}
            ORDER BY (SELECT COUNT(*) FROM album_likes WHERE album_id = a.id) DESC,
                     a.created_at DESC, a.rowid DESC
            LIMIT ?2"#,
            ALBUM_SELECT, TAG_CLAUSE
        ))
        .bind(&tag)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_albums(rows)
    }

    async fn list_by_user(
        &self,
        username: &str,
        page_request: PageRequest,
    ) -> Result<Page<Album>> {
        let total = self.count_by_user(username).await?;

        let rows = query_as::<_, AlbumRow>(&format!(
            "{} WHERE a.username = ? ORDER BY a.created_at DESC, a.rowid DESC LIMIT ? OFFSET ?",
            ALBUM_SELECT
        ))
        .bind(username)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(
            Self::rows_to_albums(rows)?,
            total as u64,
            page_request,
        ))
    }

    async fn random(&self) -> Result<Option<Album>> {
        let row = query_as::<_, AlbumRow>(&format!("{} ORDER BY RANDOM() LIMIT 1", ALBUM_SELECT))
            .fetch_optional(&self.pool)
            .await?;

        row.map(Album::try_from).transpose()
    }

    async fn toggle_like(&self, album_id: &str, username: &str) -> Result<LikeState> {
        // Write first: the write lock must be held before any read.
        let mut tx = self.pool.begin().await?;

        let removed = query("DELETE FROM album_likes WHERE album_id = ? AND username = ?")
            .bind(album_id)
            .bind(username)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            let inserted = query(
                "INSERT INTO album_likes (album_id, username, created_at)
                 SELECT ?, ?, ? WHERE EXISTS (SELECT 1 FROM albums WHERE id = ?)",
            )
            .bind(album_id)
            .bind(username)
            .bind(chrono::Utc::now().timestamp())
            .bind(album_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if inserted == 0 {
                return Err(LibraryError::not_found("Album", album_id));
            }
        }

        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM album_likes WHERE album_id = ?")
            .bind(album_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(album_id, username, liked = !removed, count, "Toggled album like");
        Ok(LikeState {
            liked: !removed,
            count,
        })
    }

    async fn likers(&self, album_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT username FROM album_likes WHERE album_id = ? ORDER BY created_at, rowid",
        )
        .bind(album_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(u,)| u).collect())
    }

    async fn likes_received(&self, username: &str) -> Result<i64> {
        let count: i64 = query_as(
            r#"
            SELECT COUNT(*) FROM album_likes l
            INNER JOIN albums a ON a.id = l.album_id
            WHERE a.username = ?
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn all_tags(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = query_as(
            "SELECT DISTINCT j.value FROM albums a, json_each(a.tags) j ORDER BY j.value",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    async fn count_by_user(&self, username: &str) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM albums WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM albums")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::tags::process_tags;

    async fn setup_repo() -> SqliteAlbumRepository {
        SqliteAlbumRepository::new(create_test_pool().await.unwrap())
    }

    fn album(username: &str, slug: &str, tags: &str, created_at: i64) -> Album {
        Album::new(
            username,
            format!("https://band.bandcamp.com/album/{}", slug),
            "Band",
            slug,
        )
        .with_platform("Bandcamp")
        .with_tags(process_tags(tags))
        .with_created_at(created_at)
    }

    #[tokio::test]
    async fn test_insert_and_find_album() {
        let repo = setup_repo().await;
        let album = album("kvlt", "hunger", "#black #raw", 100)
            .with_cover_url(Some("https://f4.bcbits.com/img/a1_16.jpg".into()));

        repo.insert(&album).await.unwrap();

        let found = repo.find_by_id(&album.id).await.unwrap().unwrap();
        assert_eq!(found, album);
        assert!(found.likers.is_empty());
    }

    #[tokio::test]
    async fn test_find_missing_album() {
        let repo = setup_repo().await;
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_album() {
        let repo = setup_repo().await;
        let album = Album::new("kvlt", "not a url", "Band", "Album");

        let err = repo.insert(&album).await.unwrap_err();
        assert!(matches!(err, LibraryError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_url_is_rejected() {
        let repo = setup_repo().await;
        let first = album("kvlt", "hunger", "", 100);
        repo.insert(&first).await.unwrap();

        let mut second = album("other", "hunger", "", 200);
        second.id = "another-id".to_string();

        let err = repo.insert(&second).await.unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateUrl { .. }));
        assert!(repo.exists_by_url(&first.url).await.unwrap());
        assert!(!repo.exists_by_url("https://nowhere").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_album() {
        let repo = setup_repo().await;
        let mut album = album("kvlt", "hunger", "black", 100);
        repo.insert(&album).await.unwrap();
        repo.toggle_like(&album.id, "fan").await.unwrap();

        album.artist = "Darkthrone".to_string();
        album.tags = process_tags("black norway");
        repo.update(&album).await.unwrap();

        let found = repo.find_by_id(&album.id).await.unwrap().unwrap();
        assert_eq!(found.artist, "Darkthrone");
        assert_eq!(found.tags.as_slice(), ["black", "norway"]);
        assert_eq!(found.likers, vec!["fan".to_string()]);
    }

    #[tokio::test]
    async fn test_update_missing_album() {
        let repo = setup_repo().await;
        let album = album("kvlt", "hunger", "", 100);

        let err = repo.update(&album).await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_to_taken_url() {
        let repo = setup_repo().await;
        let first = album("kvlt", "one", "", 100);
        let mut second = album("kvlt", "two", "", 200);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        second.url = first.url.clone();
        let err = repo.update(&second).await.unwrap_err();
        assert!(matches!(err, LibraryError::DuplicateUrl { .. }));
    }

    #[tokio::test]
    async fn test_delete_album_cascades_likes() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteAlbumRepository::new(pool.clone());
        let album = album("kvlt", "hunger", "", 100);
        repo.insert(&album).await.unwrap();
        repo.toggle_like(&album.id, "fan").await.unwrap();

        assert!(repo.delete(&album.id).await.unwrap());
        assert!(!repo.delete(&album.id).await.unwrap());

        let (likes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM album_likes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(likes, 0);
    }

    #[tokio::test]
    async fn test_toggle_like_twice_restores_state() {
        let repo = setup_repo().await;
        let album = album("kvlt", "hunger", "", 100);
        repo.insert(&album).await.unwrap();

        let liked = repo.toggle_like(&album.id, "fan").await.unwrap();
        assert_eq!(liked, LikeState { liked: true, count: 1 });

        let other = repo.toggle_like(&album.id, "another").await.unwrap();
        assert_eq!(other, LikeState { liked: true, count: 2 });
        assert_eq!(repo.likers(&album.id).await.unwrap(), vec!["fan", "another"]);

        let unliked = repo.toggle_like(&album.id, "fan").await.unwrap();
        assert_eq!(unliked, LikeState { liked: false, count: 1 });
        assert_eq!(repo.likers(&album.id).await.unwrap(), vec!["another"]);
    }

    #[tokio::test]
    async fn test_toggle_like_missing_album() {
        let repo = setup_repo().await;
        let err = repo.toggle_like("missing", "fan").await.unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_tag_filter() {
        let repo = setup_repo().await;
        repo.insert(&album("a", "old", "#doom", 100)).await.unwrap();
        repo.insert(&album("b", "mid", "#black", 200)).await.unwrap();
        repo.insert(&album("c", "new", "#doom #sludge", 300)).await.unwrap();

        let page = repo.list(None, PageRequest::new(0, 10)).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|a| a.album_name.as_str()).collect();
        assert_eq!(names, ["new", "mid", "old"]);
        assert_eq!(page.total, 3);

        let page = repo.list(Some("#Doom"), PageRequest::new(0, 10)).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|a| a.album_name.as_str()).collect();
        assert_eq!(names, ["new", "old"]);
        assert_eq!(page.total, 2);

        let page = repo.list(None, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].album_name, "old");
    }

    #[tokio::test]
    async fn test_ranking_orders_by_likes() {
        let repo = setup_repo().await;
        let quiet = album("a", "quiet", "#doom", 300);
        let loved = album("b", "loved", "#black", 100);
        let liked = album("c", "liked", "#doom", 200);
        for a in [&quiet, &loved, &liked] {
            repo.insert(a).await.unwrap();
        }
        for user in ["x", "y", "z"] {
            repo.toggle_like(&loved.id, user).await.unwrap();
        }
        repo.toggle_like(&liked.id, "x").await.unwrap();

        let ranking = repo.ranking(None, 10).await.unwrap();
        let names: Vec<_> = ranking.iter().map(|a| a.album_name.as_str()).collect();
        assert_eq!(names, ["loved", "liked", "quiet"]);

        let doom = repo.ranking(Some("doom"), 10).await.unwrap();
        let names: Vec<_> = doom.iter().map(|a| a.album_name.as_str()).collect();
        assert_eq!(names, ["liked", "quiet"]);

        assert_eq!(repo.ranking(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_queries() {
        let repo = setup_repo().await;
        let mine = album("kvlt", "mine", "", 100);
        repo.insert(&mine).await.unwrap();
        repo.insert(&album("kvlt", "mine2", "", 200)).await.unwrap();
        repo.insert(&album("other", "theirs", "", 300)).await.unwrap();
        repo.toggle_like(&mine.id, "x").await.unwrap();
        repo.toggle_like(&mine.id, "y").await.unwrap();

        let page = repo
            .list_by_user("kvlt", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].album_name, "mine2");
        assert_eq!(repo.count_by_user("kvlt").await.unwrap(), 2);
        assert_eq!(repo.likes_received("kvlt").await.unwrap(), 2);
        assert_eq!(repo.likes_received("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_random_and_all_tags() {
        let repo = setup_repo().await;
        assert!(repo.random().await.unwrap().is_none());

        repo.insert(&album("a", "one", "#doom #black", 100)).await.unwrap();
        repo.insert(&album("b", "two", "#black #thrash", 200)).await.unwrap();

        assert!(repo.random().await.unwrap().is_some());
        assert_eq!(
            repo.all_tags().await.unwrap(),
            vec!["black", "doom", "thrash"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_likes_are_all_kept() {
        let db = crate::db::scratch::ScratchDb::new();
        let pool = db.pool(8).await;
        let repo = SqliteAlbumRepository::new(pool.clone());
        let album = album("kvlt", "hunger", "", 100);
        repo.insert(&album).await.unwrap();

        let fans = 40;
        let handles: Vec<_> = (0..fans)
            .map(|i| {
                let repo = SqliteAlbumRepository::new(pool.clone());
                let id = album.id.clone();
                tokio::spawn(async move { repo.toggle_like(&id, &format!("fan{}", i)).await })
            })
            .collect();

        for handle in handles {
            let state = handle.await.unwrap().unwrap();
            assert!(state.liked);
        }

        assert_eq!(repo.likers(&album.id).await.unwrap().len(), fans);
        pool.close().await;
    }
}
