use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Page, PageRequest, StoryQuery};
use crate::error::Result;
use crate::models::Story;

/// Story aggregate store.
///
/// Mutations are load-mutate-save: `save` replaces the whole document and
/// there is no optimistic locking, so concurrent writers to the same story
/// are last-write-wins.
#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Story>>;

    /// Upsert the whole aggregate.
    async fn save(&self, story: &Story) -> Result<Story>;

    /// Returns false when no story had that id.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Filtered page, newest first (ties by id ascending).
    async fn find(&self, query: &StoryQuery, page: PageRequest) -> Result<Page<Story>>;
}

/// PostgreSQL-backed store. Filter columns are denormalised next to the JSONB
/// document so list queries can use indexes.
#[derive(Clone)]
pub struct PgStoryStore {
    pool: PgPool,
}

impl PgStoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryStore for PgStoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Story>> {
        let row: Option<(Json<Story>,)> =
            sqlx::query_as("SELECT document FROM stories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(document,)| document.0))
    }

    async fn save(&self, story: &Story) -> Result<Story> {
        sqlx::query(
            r#"
            INSERT INTO stories (id, user_id, title, content, visibility, category, hashtags, anonymous, created_at, updated_at, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                visibility = EXCLUDED.visibility,
                category = EXCLUDED.category,
                hashtags = EXCLUDED.hashtags,
                anonymous = EXCLUDED.anonymous,
                updated_at = EXCLUDED.updated_at,
                document = EXCLUDED.document
            "#,
        )
        .bind(story.id)
        .bind(&story.user_id)
        .bind(&story.title)
        .bind(&story.content)
        .bind(story.visibility.as_str())
        .bind(story.category.as_str())
        .bind(&story.hashtags)
        .bind(story.anonymous)
        .bind(story.created_at)
        .bind(story.updated_at)
        .bind(Json(story))
        .execute(&self.pool)
        .await?;

        Ok(story.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, query: &StoryQuery, page: PageRequest) -> Result<Page<Story>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM stories");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        if total == 0 {
            return Ok(Page::empty(page));
        }

        let mut select = QueryBuilder::<Postgres>::new("SELECT document FROM stories");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(i64::from(page.size))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows: Vec<(Json<Story>,)> = select
            .build_query_as::<(Json<Story>,)>()
            .fetch_all(&self.pool)
            .await?;
        let stories = rows.into_iter().map(|(document,)| document.0).collect();

        Ok(Page::new(stories, page, total as u64))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &StoryQuery) {
    builder.push(" WHERE TRUE");

    if let Some(visibility) = query.visibility {
        builder
            .push(" AND visibility = ")
            .push_bind(visibility.as_str());
    }
    if let Some(category) = query.category {
        builder.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(author) = &query.author_id {
        builder.push(" AND user_id = ").push_bind(author.clone());
    }
    if let Some(anonymous) = query.anonymous {
        builder.push(" AND anonymous = ").push_bind(anonymous);
    }
    if let Some(tag) = &query.hashtag {
        builder
            .push(" AND ")
            .push_bind(tag.clone())
            .push(" = ANY(hashtags)");
    }
    if let Some(text) = &query.text {
        let pattern = format!("%{}%", escape_like(text));
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escape LIKE metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
