/// Bookmark handlers
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::Result;
use crate::middleware::UserId;

pub async fn toggle_bookmark(
    state: web::Data<AppState>,
    story_id: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    let bookmarked = state.bookmarks.toggle(user.as_str(), *story_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "bookmarked": bookmarked })))
}

pub async fn my_bookmarks(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let stories = state.bookmarks.list(user.as_str()).await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}
