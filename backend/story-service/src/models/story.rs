use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::hashtags::extract_hashtags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Public => Visibility::Private,
            Visibility::Private => Visibility::Public,
        }
    }
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Visibility::Public),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(AppError::InvalidArgument(format!(
                "invalid visibility '{}'. Allowed: PUBLIC, PRIVATE",
                other
            ))),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StoryCategory {
    #[default]
    General,
    Healing,
    Love,
    Heartbreak,
    Motivation,
    Life,
}

impl StoryCategory {
    pub const ALL: [StoryCategory; 6] = [
        StoryCategory::General,
        StoryCategory::Healing,
        StoryCategory::Love,
        StoryCategory::Heartbreak,
        StoryCategory::Motivation,
        StoryCategory::Life,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryCategory::General => "GENERAL",
            StoryCategory::Healing => "HEALING",
            StoryCategory::Love => "LOVE",
            StoryCategory::Heartbreak => "HEARTBREAK",
            StoryCategory::Motivation => "MOTIVATION",
            StoryCategory::Life => "LIFE",
        }
    }
}

impl FromStr for StoryCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        StoryCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| {
                AppError::InvalidArgument(
                    "Invalid category. Allowed: GENERAL, HEALING, LOVE, HEARTBREAK, MOTIVATION, LIFE"
                        .to_string(),
                )
            })
    }
}

impl fmt::Display for StoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category filter accepted by list queries: a concrete category or `ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(StoryCategory),
}

impl CategoryFilter {
    /// Blank input and `ALL` (any case) select every category.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(CategoryFilter::All),
            Some(value) if value.eq_ignore_ascii_case("ALL") => Ok(CategoryFilter::All),
            Some(value) => value.parse().map(CategoryFilter::Only),
        }
    }

    pub fn category(&self) -> Option<StoryCategory> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(*category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: String,
    #[serde(rename = "type")]
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a story. Optional fields fall back to the defaults
/// (GENERAL, PUBLIC, not anonymous).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    pub visibility: Option<Visibility>,
    pub category: Option<StoryCategory>,
    pub anonymous: Option<bool>,
}

/// Owner edit request. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub visibility: Option<String>,
}

/// Story aggregate root.
///
/// Comments form an append-only sequence; reactions are keyed by author so a
/// story can never hold two reactions from the same user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub category: StoryCategory,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub reactions: BTreeMap<String, Reaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    pub fn new(
        author_id: &str,
        draft: StoryDraft,
        image_urls: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let hashtags = extract_hashtags(&draft.content);
        Self {
            id: Uuid::new_v4(),
            user_id: author_id.to_string(),
            title: draft.title,
            content: draft.content,
            visibility: draft.visibility.unwrap_or_default(),
            category: draft.category.unwrap_or_default(),
            anonymous: draft.anonymous.unwrap_or(false),
            image_urls,
            hashtags,
            comments: Vec::new(),
            reactions: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// PUBLIC stories are visible to everyone, PRIVATE ones only to the owner.
    pub fn is_visible_to(&self, viewer: Option<&str>) -> bool {
        self.is_public() || viewer.map(|v| self.is_owned_by(v)).unwrap_or(false)
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Replace the content and re-derive hashtags from it.
    pub fn set_content(&mut self, content: String) {
        self.hashtags = extract_hashtags(&content);
        self.content = content;
    }

    pub fn add_comment(&mut self, user_id: &str, text: &str, now: DateTime<Utc>) -> &Comment {
        self.comments.push(Comment {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            text: text.to_string(),
            created_at: now,
        });
        self.updated_at = now;
        &self.comments[self.comments.len() - 1]
    }

    /// Insert the author's reaction, dropping any reaction they left before.
    /// Returns the replaced reaction, if any.
    pub fn put_reaction(
        &mut self,
        user_id: &str,
        reaction_type: &str,
        now: DateTime<Utc>,
    ) -> Option<Reaction> {
        self.updated_at = now;
        self.reactions.insert(
            user_id.to_string(),
            Reaction {
                user_id: user_id.to_string(),
                reaction_type: reaction_type.to_string(),
                created_at: now,
            },
        )
    }

    /// Remove a comment on behalf of `actor`, who must be the comment author
    /// or the story owner. The comment list is untouched on failure.
    pub fn remove_comment(
        &mut self,
        comment_id: Uuid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        if self.comments.is_empty() {
            return Err(AppError::NotFound("No comments found".into()));
        }

        let position = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

        if self.comments[position].user_id != actor && !self.is_owned_by(actor) {
            return Err(AppError::Forbidden(
                "only the comment author or story owner can delete this comment".into(),
            ));
        }

        self.updated_at = now;
        Ok(self.comments.remove(position))
    }

    /// Apply an owner edit. Fails without mutating on a bad visibility value.
    pub fn apply_edit(&mut self, edit: StoryEdit, now: DateTime<Utc>) -> Result<()> {
        let visibility = edit
            .visibility
            .as_deref()
            .map(Visibility::from_str)
            .transpose()?;

        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(content) = edit.content {
            self.set_content(content);
        }
        if let Some(visibility) = visibility {
            self.visibility = visibility;
        }
        self.updated_at = now;
        Ok(())
    }
}
