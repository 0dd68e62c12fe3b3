//! Story ranking
//!
//! Three modes, all over PUBLIC stories only:
//! - most-liked: reaction count
//! - trending: `likes*2 + comments*3 - hours_since_created`
//! - personalized feed: engagement, freshness and the viewer's learned
//!   category/author/hashtag affinities
//!
//! Candidates are loaded from the store in recency order, scored in memory
//! and sorted by score descending. Equal scores keep recency order (newest
//! first, then id ascending), so every mode is deterministic.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::RankingConfig;
use crate::db::{recency_order, PageRequest, StoryQuery, StoryStore};
use crate::error::Result;
use crate::metrics::ranking::{
    RANKING_CANDIDATE_COUNT, RANKING_REQUEST_DURATION_SECONDS, RANKING_REQUEST_TOTAL,
};
use crate::models::{Story, UserPreference};
use crate::services::PreferenceService;

const LIKE_WEIGHT: i64 = 2;
const COMMENT_WEIGHT: i64 = 3;

const FEED_REACTION_WEIGHT: i64 = 3;
const FEED_COMMENT_WEIGHT: i64 = 2;
const FEED_FRESHNESS_BONUS: i64 = 5;
const FEED_FRESHNESS_WINDOW_HOURS: i64 = 24;
const FEED_CATEGORY_WEIGHT: i64 = 4;
const FEED_AUTHOR_WEIGHT: i64 = 5;
const FEED_HASHTAG_WEIGHT: i64 = 2;

/// Decay-adjusted engagement score.
///
/// Hours are whole hours elapsed since creation (truncated), so a story
/// loses one point per full hour of age.
pub fn trending_score(story: &Story, now: DateTime<Utc>) -> i64 {
    let hours_since_created = (now - story.created_at).num_hours();

    story.reaction_count() as i64 * LIKE_WEIGHT + story.comment_count() as i64 * COMMENT_WEIGHT
        - hours_since_created
}

/// Personalized feed score. Without a preference only engagement and
/// freshness count; keys absent from the preference maps contribute 0.
pub fn feed_score(story: &Story, preference: Option<&UserPreference>, now: DateTime<Utc>) -> i64 {
    let mut score = story.reaction_count() as i64 * FEED_REACTION_WEIGHT
        + story.comment_count() as i64 * FEED_COMMENT_WEIGHT;

    if story.created_at > now - Duration::hours(FEED_FRESHNESS_WINDOW_HOURS) {
        score += FEED_FRESHNESS_BONUS;
    }

    let Some(pref) = preference else {
        return score;
    };

    score += pref.category_score(story.category) * FEED_CATEGORY_WEIGHT;
    score += pref.author_score(&story.user_id) * FEED_AUTHOR_WEIGHT;
    score += story
        .hashtags
        .iter()
        .map(|tag| pref.hashtag_score(tag) * FEED_HASHTAG_WEIGHT)
        .sum::<i64>();

    score
}

/// Sort by score descending, breaking ties by recency order.
fn rank_by<F>(candidates: Vec<Story>, score: F) -> Vec<Story>
where
    F: Fn(&Story) -> i64,
{
    let mut scored: Vec<(i64, Story)> = candidates
        .into_iter()
        .map(|story| (score(&story), story))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| match score_b.cmp(score_a) {
        Ordering::Equal => recency_order(a, b),
        other => other,
    });

    scored.into_iter().map(|(_, story)| story).collect()
}

pub struct RankingService {
    stories: Arc<dyn StoryStore>,
    preferences: PreferenceService,
    limits: RankingConfig,
}

impl RankingService {
    pub fn new(
        stories: Arc<dyn StoryStore>,
        preferences: PreferenceService,
        limits: RankingConfig,
    ) -> Self {
        Self {
            stories,
            preferences,
            limits,
        }
    }

    /// Newest PUBLIC stories, at most `limit`.
    async fn public_candidates(&self, mode: &str, limit: u32) -> Result<Vec<Story>> {
        let page = self
            .stories
            .find(&StoryQuery::public(), PageRequest::first(limit))
            .await?;

        RANKING_CANDIDATE_COUNT
            .with_label_values(&[mode])
            .observe(page.content.len() as f64);

        Ok(page.content)
    }

    pub async fn most_liked(&self) -> Result<Vec<Story>> {
        let _timer = RANKING_REQUEST_DURATION_SECONDS
            .with_label_values(&["most_liked"])
            .start_timer();
        RANKING_REQUEST_TOTAL.with_label_values(&["most_liked"]).inc();

        let candidates = self
            .public_candidates("most_liked", self.limits.most_liked_limit)
            .await?;

        Ok(rank_by(candidates, |story| story.reaction_count() as i64))
    }

    pub async fn trending(&self) -> Result<Vec<Story>> {
        self.trending_at(Utc::now()).await
    }

    pub async fn trending_at(&self, now: DateTime<Utc>) -> Result<Vec<Story>> {
        let _timer = RANKING_REQUEST_DURATION_SECONDS
            .with_label_values(&["trending"])
            .start_timer();
        RANKING_REQUEST_TOTAL.with_label_values(&["trending"]).inc();

        let candidates = self
            .public_candidates("trending", self.limits.trending_limit)
            .await?;

        Ok(rank_by(candidates, |story| trending_score(story, now)))
    }

    /// Feed for `viewer`. Anonymous viewers get the unranked recency list.
    pub async fn personalized_feed(&self, viewer: Option<&str>) -> Result<Vec<Story>> {
        self.personalized_feed_at(viewer, Utc::now()).await
    }

    pub async fn personalized_feed_at(
        &self,
        viewer: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Story>> {
        let Some(user_id) = viewer else {
            let _timer = RANKING_REQUEST_DURATION_SECONDS
                .with_label_values(&["recent"])
                .start_timer();
            RANKING_REQUEST_TOTAL.with_label_values(&["recent"]).inc();
            return self
                .public_candidates("recent", self.limits.feed_candidate_limit)
                .await;
        };

        let _timer = RANKING_REQUEST_DURATION_SECONDS
            .with_label_values(&["feed"])
            .start_timer();
        RANKING_REQUEST_TOTAL.with_label_values(&["feed"]).inc();

        let candidates = self
            .public_candidates("feed", self.limits.feed_candidate_limit)
            .await?;

        // A feed read never fails on the preference store; it ranks as if the
        // user had no history.
        let preference = match self.preferences.get_preferences(user_id).await {
            Ok(pref) => Some(pref),
            Err(e) => {
                warn!(user_id = user_id, error = %e, "Preference load failed, ranking without affinities");
                None
            }
        };

        debug!(
            user_id = user_id,
            candidates = candidates.len(),
            has_history = preference.as_ref().map(|p| !p.is_empty()).unwrap_or(false),
            "Ranking personalized feed"
        );

        Ok(rank_by(candidates, |story| {
            feed_score(story, preference.as_ref(), now)
        }))
    }
}
