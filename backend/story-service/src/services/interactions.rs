/// Comments and reactions
///
/// A successful interaction is saved first; owner notification and
/// preference learning follow as best-effort side effects whose failures are
/// logged and never surfaced. Rejected attempts have no side effects.
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{NotificationKind, Notifier};
use crate::db::StoryStore;
use crate::error::{AppError, Result};
use crate::metrics::ranking::{INTERACTION_TOTAL, PREFERENCE_UPDATE_FAILURES};
use crate::models::Story;
use crate::services::PreferenceService;

const DEFAULT_REACTION: &str = "LIKE";

pub struct InteractionRecorder {
    stories: Arc<dyn StoryStore>,
    preferences: PreferenceService,
    notifier: Arc<dyn Notifier>,
}

impl InteractionRecorder {
    pub fn new(
        stories: Arc<dyn StoryStore>,
        preferences: PreferenceService,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            stories,
            preferences,
            notifier,
        }
    }

    /// Append a comment to a PUBLIC story and return the updated story.
    pub async fn add_comment(&self, story_id: Uuid, actor: &str, text: &str) -> Result<Story> {
        let result = self.try_add_comment(story_id, actor, text).await;
        count_outcome("comment", &result);
        result
    }

    async fn try_add_comment(&self, story_id: Uuid, actor: &str, text: &str) -> Result<Story> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::InvalidArgument(
                "comment text must not be blank".into(),
            ));
        }

        let mut story = self.load(story_id).await?;
        if !story.is_public() {
            return Err(AppError::Forbidden("Cannot comment on private story".into()));
        }

        let comment_id = story.add_comment(actor, text, Utc::now()).id;
        let saved = self.stories.save(&story).await?;

        info!(story_id = %story_id, comment_id = %comment_id, user_id = actor, "Comment added");

        self.after_interaction(&saved, actor, NotificationKind::Comment)
            .await;
        Ok(saved)
    }

    /// Add or replace the actor's reaction. The type defaults to LIKE and is
    /// stored upper-cased.
    pub async fn react(
        &self,
        story_id: Uuid,
        actor: &str,
        reaction_type: Option<&str>,
    ) -> Result<Story> {
        let result = self.try_react(story_id, actor, reaction_type).await;
        count_outcome("reaction", &result);
        result
    }

    async fn try_react(
        &self,
        story_id: Uuid,
        actor: &str,
        reaction_type: Option<&str>,
    ) -> Result<Story> {
        let reaction_type = normalize_reaction(reaction_type);

        let mut story = self.load(story_id).await?;
        let replaced = story.put_reaction(actor, &reaction_type, Utc::now());
        let saved = self.stories.save(&story).await?;

        info!(
            story_id = %story_id,
            user_id = actor,
            reaction = %reaction_type,
            replaced = replaced.is_some(),
            "Reaction saved"
        );

        self.after_interaction(&saved, actor, NotificationKind::Like)
            .await;
        Ok(saved)
    }

    async fn load(&self, story_id: Uuid) -> Result<Story> {
        self.stories
            .get(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))
    }

    async fn after_interaction(&self, story: &Story, actor: &str, kind: NotificationKind) {
        if !story.is_owned_by(actor) {
            if let Err(e) = self
                .notifier
                .notify(&story.user_id, actor, story.id, kind)
                .await
            {
                warn!(story_id = %story.id, kind = kind.as_str(), error = %e, "Failed to notify story owner");
            }
        }

        if let Err(e) = self.preferences.record_interaction(actor, story).await {
            PREFERENCE_UPDATE_FAILURES.inc();
            warn!(story_id = %story.id, user_id = actor, error = %e, "Failed to record preference interaction");
        }
    }
}

fn normalize_reaction(reaction_type: Option<&str>) -> String {
    match reaction_type.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_uppercase(),
        _ => DEFAULT_REACTION.to_string(),
    }
}

fn count_outcome(kind: &str, result: &Result<Story>) {
    let outcome = if result.is_ok() { "ok" } else { "rejected" };
    INTERACTION_TOTAL.with_label_values(&[kind, outcome]).inc();
}
