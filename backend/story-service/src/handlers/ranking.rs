/// Ranking handlers - most-liked, trending and personalized feed
use actix_web::{web, HttpResponse};

use super::AppState;
use crate::error::Result;
use crate::middleware::UserId;

pub async fn most_liked(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stories = state.ranking.most_liked().await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn trending(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stories = state.ranking.trending().await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

/// Ranked for the caller when authenticated, most recent first otherwise.
pub async fn personalized_feed(
    state: web::Data<AppState>,
    user: Option<UserId>,
) -> Result<HttpResponse> {
    let stories = state
        .ranking
        .personalized_feed(user.as_ref().map(UserId::as_str))
        .await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}
