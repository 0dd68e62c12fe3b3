/// Story Service Library
///
/// Stories with comments and reactions, per-user preference learning, and
/// the three ranking modes (most-liked, trending, personalized feed) of the
/// Unsaid story-sharing platform.
///
/// # Modules
///
/// - `models`: story aggregate and user preference types
/// - `db`: story, preference and bookmark stores (PostgreSQL, Redis, in-memory)
/// - `services`: ranking, preference learning, interactions and story lifecycle
/// - `clients`: notification, profile lookup and media upload collaborators
/// - `handlers`: HTTP request handlers
/// - `middleware`: JWT authentication
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use clients::{DisabledMediaUploader, StaticProfileLookup, TracingNotifier};
use db::{InMemoryBookmarkStore, InMemoryPreferenceStore, InMemoryStoryStore};
use handlers::Backends;

/// Process-local stores with log-only notifications, no profile data and
/// uploads disabled.
pub fn memory_backends() -> Backends {
    Backends {
        stories: Arc::new(InMemoryStoryStore::new()),
        preferences: Arc::new(InMemoryPreferenceStore::new()),
        bookmarks: Arc::new(InMemoryBookmarkStore::new()),
        notifier: Arc::new(TracingNotifier),
        profiles: Arc::new(StaticProfileLookup::new()),
        uploader: Arc::new(DisabledMediaUploader),
    }
}
