use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Flip the bookmark. Returns true when the story is now bookmarked.
    async fn toggle(&self, user_id: &str, story_id: Uuid) -> Result<bool>;

    /// Bookmarked story ids, most recently bookmarked first.
    async fn list_story_ids(&self, user_id: &str) -> Result<Vec<Uuid>>;
}

#[derive(Clone)]
pub struct PgBookmarkStore {
    pool: PgPool,
}

impl PgBookmarkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookmarkStore for PgBookmarkStore {
    async fn toggle(&self, user_id: &str, story_id: Uuid) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND story_id = $2")
            .bind(user_id)
            .bind(story_id)
            .execute(&self.pool)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"INSERT INTO bookmarks (user_id, story_id) VALUES ($1, $2)
               ON CONFLICT (user_id, story_id) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(story_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn list_story_ids(&self, user_id: &str) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"SELECT story_id FROM bookmarks WHERE user_id = $1 ORDER BY created_at DESC, story_id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| r.get::<Uuid, _>("story_id"))
            .collect())
    }
}
