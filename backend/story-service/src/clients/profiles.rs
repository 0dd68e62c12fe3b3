use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub profile_image_url: Option<String>,
}

/// Resolves user ids to public profiles. Unknown ids are absent from the map.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn find_profiles(&self, user_ids: &[String]) -> Result<HashMap<String, UserProfile>>;
}

/// Reads the identity service's `users` table. User ids are usernames.
#[derive(Clone)]
pub struct PgProfileLookup {
    pool: PgPool,
}

impl PgProfileLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileLookup for PgProfileLookup {
    async fn find_profiles(&self, user_ids: &[String]) -> Result<HashMap<String, UserProfile>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<UserProfile> = sqlx::query_as(
            r#"
            SELECT username AS id, username, profile_image_url
            FROM users
            WHERE username = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|p| (p.id.clone(), p)).collect())
    }
}

/// Fixed profile table, used in memory mode and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProfileLookup {
    profiles: HashMap<String, UserProfile>,
}

impl StaticProfileLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, id: &str, profile_image_url: Option<&str>) -> Self {
        self.profiles.insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                username: id.to_string(),
                profile_image_url: profile_image_url.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl ProfileLookup for StaticProfileLookup {
    async fn find_profiles(&self, user_ids: &[String]) -> Result<HashMap<String, UserProfile>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.profiles.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }
}
