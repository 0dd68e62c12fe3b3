// ============================================
// User Preference Store
// ============================================
//
// Redis keys (one hash per score map):
// - {prefix}:{user_id}:category - category -> score
// - {prefix}:{user_id}:hashtag  - hashtag  -> score
// - {prefix}:{user_id}:author   - author   -> score
//
// An interaction is applied as HINCRBY increments inside one MULTI/EXEC
// pipeline, so concurrent interactions for the same user never lose an
// increment.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::debug;

use crate::error::Result;
use crate::models::preference::{AUTHOR_WEIGHT, CATEGORY_WEIGHT, HASHTAG_WEIGHT};
use crate::models::{PreferenceDelta, UserPreference};

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// `None` when the user has never interacted.
    async fn load(&self, user_id: &str) -> Result<Option<UserPreference>>;

    /// Atomically add one interaction's increments, creating the entry lazily.
    async fn apply(&self, user_id: &str, delta: &PreferenceDelta) -> Result<()>;
}

pub struct RedisPreferenceStore {
    redis: ConnectionManager,
    key_prefix: String,
}

impl RedisPreferenceStore {
    pub fn new(redis: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            redis,
            key_prefix: key_prefix.into(),
        }
    }

    fn category_key(&self, user_id: &str) -> String {
        format!("{}:{}:category", self.key_prefix, user_id)
    }

    fn hashtag_key(&self, user_id: &str) -> String {
        format!("{}:{}:hashtag", self.key_prefix, user_id)
    }

    fn author_key(&self, user_id: &str) -> String {
        format!("{}:{}:author", self.key_prefix, user_id)
    }
}

#[async_trait]
impl PreferenceStore for RedisPreferenceStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserPreference>> {
        let mut conn = self.redis.clone();

        let (category_scores, hashtag_scores, author_scores): (
            HashMap<String, i64>,
            HashMap<String, i64>,
            HashMap<String, i64>,
        ) = redis::pipe()
            .hgetall(self.category_key(user_id))
            .hgetall(self.hashtag_key(user_id))
            .hgetall(self.author_key(user_id))
            .query_async(&mut conn)
            .await?;

        let preference = UserPreference {
            user_id: user_id.to_string(),
            category_scores,
            hashtag_scores,
            author_scores,
        };

        if preference.is_empty() {
            Ok(None)
        } else {
            Ok(Some(preference))
        }
    }

    async fn apply(&self, user_id: &str, delta: &PreferenceDelta) -> Result<()> {
        let mut conn = self.redis.clone();
        let hashtag_key = self.hashtag_key(user_id);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hincr(
            self.category_key(user_id),
            delta.category.as_str(),
            CATEGORY_WEIGHT,
        )
        .ignore();
        for tag in &delta.hashtags {
            pipe.hincr(&hashtag_key, tag, HASHTAG_WEIGHT).ignore();
        }
        pipe.hincr(self.author_key(user_id), &delta.author_id, AUTHOR_WEIGHT)
            .ignore();

        let _: () = pipe.query_async(&mut conn).await?;

        debug!(
            user_id = user_id,
            category = delta.category.as_str(),
            hashtags = delta.hashtags.len(),
            "Preference scores incremented"
        );

        Ok(())
    }
}
