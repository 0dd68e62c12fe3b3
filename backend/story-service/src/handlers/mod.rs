/// HTTP handlers for story-service
///
/// - `stories`: story lifecycle and listings
/// - `ranking`: most-liked, trending and personalized feed
/// - `interactions`: comments and reactions
/// - `bookmarks`: bookmark toggle and listing
/// - `health`: liveness and readiness probes
///
/// Routes are mounted under `/api/v1` by `main`, behind `JwtAuthMiddleware`.
pub mod bookmarks;
pub mod health;
pub mod interactions;
pub mod ranking;
pub mod stories;

use std::sync::Arc;

use actix_web::web;
use serde::Deserialize;

use crate::clients::{MediaUploader, Notifier, ProfileLookup};
use crate::config::RankingConfig;
use crate::db::{BookmarkStore, PageRequest, PreferenceStore, StoryStore};
use crate::services::{
    BookmarkService, InteractionRecorder, PreferenceService, RankingService, StoryService,
    ViewAssembler,
};

/// Storage and collaborator implementations the service is wired with.
#[derive(Clone)]
pub struct Backends {
    pub stories: Arc<dyn StoryStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub bookmarks: Arc<dyn BookmarkStore>,
    pub notifier: Arc<dyn Notifier>,
    pub profiles: Arc<dyn ProfileLookup>,
    pub uploader: Arc<dyn MediaUploader>,
}

/// Shared handler state, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub stories: StoryService,
    pub ranking: RankingService,
    pub interactions: InteractionRecorder,
    pub bookmarks: BookmarkService,
    pub views: ViewAssembler,
    /// Store probed by the readiness check
    pub store: Arc<dyn StoryStore>,
}

impl AppState {
    pub fn new(backends: Backends, limits: RankingConfig) -> Self {
        let preferences = PreferenceService::new(backends.preferences.clone());

        Self {
            stories: StoryService::new(
                backends.stories.clone(),
                backends.uploader.clone(),
                limits.list_batch_size,
            ),
            ranking: RankingService::new(backends.stories.clone(), preferences.clone(), limits),
            interactions: InteractionRecorder::new(
                backends.stories.clone(),
                preferences,
                backends.notifier.clone(),
            ),
            bookmarks: BookmarkService::new(
                backends.bookmarks.clone(),
                backends.stories.clone(),
                backends.notifier.clone(),
            ),
            views: ViewAssembler::new(backends.profiles.clone()),
            store: backends.stories,
        }
    }
}

/// `?page=&size=` query parameters; absent values use the endpoint default.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    pub fn to_request(&self, default_size: u32) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(0), self.size.unwrap_or(default_size))
    }
}

/// Register every route relative to the `/api/v1` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(health::health))
            .route("/ready", web::get().to(health::readiness))
            .route("/live", web::get().to(health::liveness)),
    )
    .service(
        web::scope("/stories")
            .route("", web::get().to(stories::list_public))
            .route("", web::post().to(stories::create_story))
            // static segments before "/{id}"
            .route("/paged", web::get().to(stories::paged_public))
            .route("/search", web::get().to(stories::search))
            .route("/most-liked", web::get().to(ranking::most_liked))
            .route("/trending", web::get().to(ranking::trending))
            .route("/feed", web::get().to(ranking::personalized_feed))
            .route("/my/private", web::get().to(stories::my_private))
            .route("/my/public", web::get().to(stories::my_public))
            .route("/user/{username}", web::get().to(stories::by_user))
            .route("/hashtag/{tag}", web::get().to(stories::by_hashtag))
            .route("/category/{category}", web::get().to(stories::by_category))
            .route("/{id}", web::get().to(stories::get_story))
            .route("/{id}", web::put().to(stories::edit_story))
            .route("/{id}", web::delete().to(stories::delete_story))
            .route("/{id}/visibility", web::patch().to(stories::toggle_visibility))
            .route("/{id}/comments", web::post().to(interactions::add_comment))
            .route("/{id}/comments/paged", web::get().to(interactions::comments_paged))
            .route(
                "/{id}/comments/{comment_id}",
                web::delete().to(interactions::delete_comment),
            )
            .route("/{id}/reactions", web::post().to(interactions::react)),
    )
    .service(
        web::scope("/bookmarks")
            .route("/me", web::get().to(bookmarks::my_bookmarks))
            .route("/{story_id}", web::post().to(bookmarks::toggle_bookmark)),
    );
}
