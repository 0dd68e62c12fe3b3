use std::sync::Arc;

use tracing::debug;

use crate::db::PreferenceStore;
use crate::error::Result;
use crate::models::{PreferenceDelta, Story, UserPreference};

/// Learns per-user affinities from comments and reactions.
#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceService {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Add the story's category, hashtag and author weights to the user's
    /// scores. The preference entry is created on first interaction.
    pub async fn record_interaction(&self, user_id: &str, story: &Story) -> Result<()> {
        let delta = PreferenceDelta::from_story(story);
        self.store.apply(user_id, &delta).await?;

        debug!(
            user_id = user_id,
            story_id = %story.id,
            category = story.category.as_str(),
            "Recorded interaction"
        );
        Ok(())
    }

    /// Current scores; a user without history gets an empty preference.
    pub async fn get_preferences(&self, user_id: &str) -> Result<UserPreference> {
        Ok(self
            .store
            .load(user_id)
            .await?
            .unwrap_or_else(|| UserPreference::new(user_id)))
    }
}
