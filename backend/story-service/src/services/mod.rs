//! Business logic layer for story-service
//!
//! - `hashtags`: hashtag derivation from story content
//! - `preferences`: preference learning from interactions
//! - `ranking`: most-liked, trending and personalized feed ordering
//! - `interactions`: comments and reactions with their side effects
//! - `stories`: story lifecycle and listing queries
//! - `views`: response shaping with batched profile lookups
//! - `bookmarks`: bookmark toggling and listing
pub mod bookmarks;
pub mod hashtags;
pub mod interactions;
pub mod preferences;
pub mod ranking;
pub mod stories;
pub mod views;

pub use bookmarks::BookmarkService;
pub use hashtags::extract_hashtags;
pub use interactions::InteractionRecorder;
pub use preferences::PreferenceService;
pub use ranking::{feed_score, trending_score, RankingService};
pub use stories::{ImageUpload, StoryService};
pub use views::{CommentView, StoryView, UserMini, ViewAssembler};
