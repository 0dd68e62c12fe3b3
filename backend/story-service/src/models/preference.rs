use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::story::{Story, StoryCategory};

/// Score added to the story's category on each interaction.
pub const CATEGORY_WEIGHT: i64 = 2;
/// Score added to each hashtag carried by the story.
pub const HASHTAG_WEIGHT: i64 = 1;
/// Score added to the story's author.
pub const AUTHOR_WEIGHT: i64 = 1;

/// Per-user affinity scores learned from comments and reactions.
///
/// Absent keys score 0. Scores only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: String,
    #[serde(default)]
    pub category_scores: HashMap<String, i64>,
    #[serde(default)]
    pub hashtag_scores: HashMap<String, i64>,
    #[serde(default)]
    pub author_scores: HashMap<String, i64>,
}

impl UserPreference {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn category_score(&self, category: StoryCategory) -> i64 {
        self.category_scores
            .get(category.as_str())
            .copied()
            .unwrap_or(0)
    }

    pub fn hashtag_score(&self, tag: &str) -> i64 {
        self.hashtag_scores.get(tag).copied().unwrap_or(0)
    }

    pub fn author_score(&self, author_id: &str) -> i64 {
        self.author_scores.get(author_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.category_scores.is_empty()
            && self.hashtag_scores.is_empty()
            && self.author_scores.is_empty()
    }

    /// Fold an interaction delta into the in-memory maps.
    pub fn apply(&mut self, delta: &PreferenceDelta) {
        *self
            .category_scores
            .entry(delta.category.as_str().to_string())
            .or_insert(0) += CATEGORY_WEIGHT;
        for tag in &delta.hashtags {
            *self.hashtag_scores.entry(tag.clone()).or_insert(0) += HASHTAG_WEIGHT;
        }
        *self
            .author_scores
            .entry(delta.author_id.clone())
            .or_insert(0) += AUTHOR_WEIGHT;
    }
}

/// The increments one interaction contributes, captured from the story the
/// user interacted with. Stores apply it as field-level increments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceDelta {
    pub category: StoryCategory,
    pub hashtags: Vec<String>,
    pub author_id: String,
}

impl PreferenceDelta {
    pub fn from_story(story: &Story) -> Self {
        Self {
            category: story.category,
            hashtags: story.hashtags.clone(),
            author_id: story.user_id.clone(),
        }
    }
}
