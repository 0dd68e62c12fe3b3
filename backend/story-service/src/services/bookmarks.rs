use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{NotificationKind, Notifier};
use crate::db::{BookmarkStore, StoryStore};
use crate::error::{AppError, Result};
use crate::models::Story;

pub struct BookmarkService {
    bookmarks: Arc<dyn BookmarkStore>,
    stories: Arc<dyn StoryStore>,
    notifier: Arc<dyn Notifier>,
}

impl BookmarkService {
    pub fn new(
        bookmarks: Arc<dyn BookmarkStore>,
        stories: Arc<dyn StoryStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            bookmarks,
            stories,
            notifier,
        }
    }

    /// Flip the bookmark; returns true when the story is now bookmarked.
    /// Only a newly created bookmark notifies the owner.
    pub async fn toggle(&self, user_id: &str, story_id: Uuid) -> Result<bool> {
        let story = self
            .stories
            .get(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))?;

        let bookmarked = self.bookmarks.toggle(user_id, story_id).await?;
        info!(story_id = %story_id, user_id = user_id, bookmarked = bookmarked, "Bookmark toggled");

        if bookmarked && !story.is_owned_by(user_id) {
            if let Err(e) = self
                .notifier
                .notify(&story.user_id, user_id, story_id, NotificationKind::Bookmark)
                .await
            {
                warn!(story_id = %story_id, error = %e, "Failed to notify story owner");
            }
        }

        Ok(bookmarked)
    }

    /// Bookmarked stories, most recently bookmarked first. Deleted stories and
    /// other users' PRIVATE stories are skipped.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Story>> {
        let ids = self.bookmarks.list_story_ids(user_id).await?;

        let mut stories = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(story) = self.stories.get(id).await? {
                if story.is_visible_to(Some(user_id)) {
                    stories.push(story);
                }
            }
        }
        Ok(stories)
    }
}
