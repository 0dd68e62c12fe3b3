/// Comment and reaction handlers
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, PageParams};
use crate::error::Result;
use crate::middleware::UserId;

const DEFAULT_COMMENT_PAGE_SIZE: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReactionRequest {
    #[serde(rename = "type", default)]
    pub reaction_type: Option<String>,
}

pub async fn add_comment(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: UserId,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let story = state
        .interactions
        .add_comment(*id, user.as_str(), &req.text)
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story(story).await))
}

/// The body is optional; the reaction type defaults to LIKE.
pub async fn react(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: UserId,
    req: Option<web::Json<ReactionRequest>>,
) -> Result<HttpResponse> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    let story = state
        .interactions
        .react(*id, user.as_str(), req.reaction_type.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story(story).await))
}

pub async fn comments_paged(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: Option<UserId>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let (story, page) = state
        .stories
        .comments_page(
            *id,
            user.as_ref().map(UserId::as_str),
            query.to_request(DEFAULT_COMMENT_PAGE_SIZE),
        )
        .await?;
    Ok(HttpResponse::Ok().json(state.views.comment_page(&story, page).await))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    user: UserId,
) -> Result<HttpResponse> {
    let (story_id, comment_id) = path.into_inner();
    let story = state
        .stories
        .delete_comment(story_id, comment_id, user.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story(story).await))
}
