//! In-memory stores.
//!
//! Backed by `DashMap`; used by the test suites and when the service runs
//! with `STORAGE_BACKEND=memory`. Reads clone whole documents, so a reader
//! always sees a complete snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{recency_order, BookmarkStore, Page, PageRequest, PreferenceStore, StoryQuery, StoryStore};
use crate::error::Result;
use crate::models::{PreferenceDelta, Story, UserPreference};

#[derive(Default)]
pub struct InMemoryStoryStore {
    stories: DashMap<Uuid, Story>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

#[async_trait]
impl StoryStore for InMemoryStoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Story>> {
        Ok(self.stories.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, story: &Story) -> Result<Story> {
        self.stories.insert(story.id, story.clone());
        Ok(story.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.stories.remove(&id).is_some())
    }

    async fn find(&self, query: &StoryQuery, page: PageRequest) -> Result<Page<Story>> {
        let mut matching: Vec<Story> = self
            .stories
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(recency_order);

        Ok(Page::from_sorted(matching, page))
    }
}

/// Increments happen under the map's per-key shard lock, so writers to one
/// user are serialised.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    preferences: DashMap<String, UserPreference>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load(&self, user_id: &str) -> Result<Option<UserPreference>> {
        Ok(self
            .preferences
            .get(user_id)
            .map(|entry| entry.value().clone()))
    }

    async fn apply(&self, user_id: &str, delta: &PreferenceDelta) -> Result<()> {
        self.preferences
            .entry(user_id.to_string())
            .or_insert_with(|| UserPreference::new(user_id))
            .apply(delta);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookmarkStore {
    bookmarks: DashMap<(String, Uuid), DateTime<Utc>>,
}

impl InMemoryBookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookmarkStore for InMemoryBookmarkStore {
    async fn toggle(&self, user_id: &str, story_id: Uuid) -> Result<bool> {
        match self.bookmarks.entry((user_id.to_string(), story_id)) {
            Entry::Occupied(occupied) => {
                occupied.remove();
                Ok(false)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Utc::now());
                Ok(true)
            }
        }
    }

    async fn list_story_ids(&self, user_id: &str) -> Result<Vec<Uuid>> {
        let mut entries: Vec<(DateTime<Utc>, Uuid)> = self
            .bookmarks
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| (*entry.value(), entry.key().1))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        Ok(entries.into_iter().map(|(_, id)| id).collect())
    }
}
