use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::clients::{ProfileLookup, UserProfile};
use crate::db::Page;
use crate::models::{Comment, Story, StoryCategory, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMini {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

impl From<&UserProfile> for UserMini {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            username: profile.username.clone(),
            profile_image_url: profile.profile_image_url.clone(),
        }
    }
}

/// Comment as returned to clients, with the author's profile fields inlined.
/// All author fields are left out for the story owner's own comments on an
/// anonymous story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Story as returned to clients. Author identity is left out entirely for
/// anonymous stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub category: StoryCategory,
    pub hashtags: Vec<String>,
    pub image_urls: Vec<String>,
    pub anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserMini>,
    #[serde(rename = "reactionsCount")]
    pub reaction_count: usize,
    pub comment_count: usize,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Builds response views, resolving every referenced profile in one lookup
/// per response.
#[derive(Clone)]
pub struct ViewAssembler {
    profiles: Arc<dyn ProfileLookup>,
}

impl ViewAssembler {
    pub fn new(profiles: Arc<dyn ProfileLookup>) -> Self {
        Self { profiles }
    }

    pub async fn story(&self, story: Story) -> StoryView {
        let profiles = self.lookup(profile_ids(std::slice::from_ref(&story))).await;
        story_view(story, &profiles)
    }

    pub async fn stories(&self, stories: Vec<Story>) -> Vec<StoryView> {
        let profiles = self.lookup(profile_ids(&stories)).await;

        stories
            .into_iter()
            .map(|story| story_view(story, &profiles))
            .collect()
    }

    pub async fn story_page(&self, page: Page<Story>) -> Page<StoryView> {
        let profiles = self.lookup(profile_ids(&page.content)).await;
        page.map(|story| story_view(story, &profiles))
    }

    /// `story` owns the comments; its anonymity decides whether the owner's
    /// comments are attributed.
    pub async fn comment_page(&self, story: &Story, page: Page<Comment>) -> Page<CommentView> {
        let hidden = hidden_author(story);
        let ids = page
            .content
            .iter()
            .filter(|c| Some(c.user_id.as_str()) != hidden)
            .map(|c| c.user_id.clone())
            .collect();
        let profiles = self.lookup(ids).await;
        page.map(|comment| comment_view(comment, hidden, &profiles))
    }

    /// Lookup failures degrade to views without profiles.
    async fn lookup(&self, ids: BTreeSet<String>) -> HashMap<String, UserProfile> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let ids: Vec<String> = ids.into_iter().collect();
        match self.profiles.find_profiles(&ids).await {
            Ok(found) => found,
            Err(e) => {
                warn!(count = ids.len(), error = %e, "Profile lookup failed");
                HashMap::new()
            }
        }
    }
}

/// The author whose identity must not appear anywhere in this story's view.
fn hidden_author(story: &Story) -> Option<&str> {
    story.anonymous.then_some(story.user_id.as_str())
}

/// Every identity a set of story views will display.
fn profile_ids(stories: &[Story]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for story in stories {
        let hidden = hidden_author(story);
        if hidden.is_none() {
            ids.insert(story.user_id.clone());
        }
        ids.extend(
            story
                .comments
                .iter()
                .filter(|c| Some(c.user_id.as_str()) != hidden)
                .map(|c| c.user_id.clone()),
        );
    }
    ids
}

fn comment_view(
    comment: Comment,
    hidden: Option<&str>,
    profiles: &HashMap<String, UserProfile>,
) -> CommentView {
    let attributed = Some(comment.user_id.as_str()) != hidden;
    let profile = profiles.get(&comment.user_id).filter(|_| attributed);

    CommentView {
        id: comment.id,
        text: comment.text,
        created_at: comment.created_at,
        username: profile.map(|p| p.username.clone()),
        profile_image_url: profile.and_then(|p| p.profile_image_url.clone()),
        user_id: attributed.then_some(comment.user_id),
    }
}

fn story_view(story: Story, profiles: &HashMap<String, UserProfile>) -> StoryView {
    let hidden = hidden_author(&story).map(str::to_string);
    let (user_id, user) = if hidden.is_some() {
        (None, None)
    } else {
        (
            Some(story.user_id.clone()),
            profiles.get(&story.user_id).map(UserMini::from),
        )
    };

    StoryView {
        id: story.id,
        reaction_count: story.reaction_count(),
        comment_count: story.comment_count(),
        title: story.title,
        content: story.content,
        visibility: story.visibility,
        category: story.category,
        hashtags: story.hashtags,
        image_urls: story.image_urls,
        anonymous: story.anonymous,
        user_id,
        user,
        comments: story
            .comments
            .into_iter()
            .map(|c| comment_view(c, hidden.as_deref(), profiles))
            .collect(),
        created_at: story.created_at,
        updated_at: story.updated_at,
    }
}
