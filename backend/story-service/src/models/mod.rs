//! Domain models: the story aggregate and the learned user preference.

pub mod preference;
pub mod story;

pub use preference::{PreferenceDelta, UserPreference};
pub use story::{
    CategoryFilter, Comment, Reaction, Story, StoryCategory, StoryDraft, StoryEdit, Visibility,
};
