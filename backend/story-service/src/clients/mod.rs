//! Collaborators the story engine talks to but does not own.
//!
//! - `notifier`: notification sink (LIKE / COMMENT / BOOKMARK)
//! - `profiles`: batch lookup of minimal public profiles
//! - `media`: image upload returning durable URLs
pub mod media;
pub mod notifier;
pub mod profiles;

pub use media::{DisabledMediaUploader, HttpMediaUploader, MediaUploader};
pub use notifier::{NotificationKind, Notifier, PgNotifier, TracingNotifier};
pub use profiles::{PgProfileLookup, ProfileLookup, StaticProfileLookup, UserProfile};
