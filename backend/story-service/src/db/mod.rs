//! Persistence layer
//!
//! - `story_repo`: story aggregate store (PostgreSQL, whole-document upsert)
//! - `preference_repo`: user preference store (Redis hashes, atomic increments)
//! - `bookmark_repo`: bookmark store (PostgreSQL)
//! - `memory`: in-memory implementations of the three stores
pub mod bookmark_repo;
pub mod memory;
pub mod preference_repo;
pub mod story_repo;

pub use bookmark_repo::{BookmarkStore, PgBookmarkStore};
pub use memory::{InMemoryBookmarkStore, InMemoryPreferenceStore, InMemoryStoryStore};
pub use preference_repo::{PreferenceStore, RedisPreferenceStore};
pub use story_repo::{PgStoryStore, StoryStore};

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{Story, StoryCategory, Visibility};

/// Zero-based page request. Stories are always returned newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const MAX_SIZE: u32 = 100;

    /// Page size is clamped to `1..=MAX_SIZE`.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// First page holding up to `limit` items, without the page-size clamp.
    /// Used for bounded candidate loads.
    pub fn first(limit: u32) -> Self {
        Self {
            page: 0,
            size: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results, serialized with the field names paging clients
/// expect (`number`, `first`, `last` alongside the totals).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    /// Same as `page`
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let total_pages = total_elements.div_ceil(u64::from(request.size));
        Self {
            content,
            page: request.page,
            number: request.page,
            size: request.size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: u64::from(request.page) + 1 >= total_pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Slice an already sorted, fully loaded collection.
    pub fn from_sorted(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as u64;
        let content = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Self::new(content, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
        }
    }
}

/// Filter for story list queries. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryQuery {
    pub visibility: Option<Visibility>,
    pub category: Option<StoryCategory>,
    pub author_id: Option<String>,
    pub hashtag: Option<String>,
    pub text: Option<String>,
    /// `Some(false)` leaves out anonymous stories
    pub anonymous: Option<bool>,
}

impl StoryQuery {
    pub fn public() -> Self {
        Self {
            visibility: Some(Visibility::Public),
            ..Default::default()
        }
    }

    pub fn with_visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: Option<StoryCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn hashtag(mut self, tag: &str) -> Self {
        self.hashtag = Some(tag.trim().trim_start_matches('#').to_lowercase());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.trim().to_string());
        self
    }

    /// Only stories that show their author.
    pub fn attributed(mut self) -> Self {
        self.anonymous = Some(false);
        self
    }

    pub fn matches(&self, story: &Story) -> bool {
        if let Some(visibility) = self.visibility {
            if story.visibility != visibility {
                return false;
            }
        }
        if let Some(category) = self.category {
            if story.category != category {
                return false;
            }
        }
        if let Some(author) = &self.author_id {
            if &story.user_id != author {
                return false;
            }
        }
        if let Some(anonymous) = self.anonymous {
            if story.anonymous != anonymous {
                return false;
            }
        }
        if let Some(tag) = &self.hashtag {
            if !story.hashtags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !story.title.to_lowercase().contains(&needle)
                && !story.content.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Canonical store order: newest first, then id ascending.
pub fn recency_order(a: &Story, b: &Story) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
