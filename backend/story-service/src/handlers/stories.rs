/// Story handlers - lifecycle and listing endpoints
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde::Deserialize;
use uuid::Uuid;

use super::{AppState, PageParams};
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{StoryDraft, StoryEdit};
use crate::services::ImageUpload;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Create a story from a multipart form: a `story` JSON part plus optional
/// `images` file parts.
pub async fn create_story(
    state: web::Data<AppState>,
    user: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut draft: Option<StoryDraft> = None;
    let mut images = Vec::new();

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::InvalidArgument(format!("Multipart error: {e}")))?;

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let bytes =
                chunk.map_err(|e| AppError::InvalidArgument(format!("Multipart read error: {e}")))?;
            data.extend_from_slice(&bytes);
            if name == "images" && data.len() > MAX_IMAGE_BYTES {
                return Err(AppError::InvalidArgument("image exceeds 10MB limit".into()));
            }
        }

        match name.as_str() {
            "story" => {
                draft = Some(serde_json::from_slice(&data).map_err(|e| {
                    AppError::InvalidArgument(format!("invalid story payload: {e}"))
                })?);
            }
            "images" => {
                let file_name = file_name.unwrap_or_else(|| format!("image-{}", images.len()));
                images.push(ImageUpload {
                    file_name,
                    bytes: data,
                });
            }
            _ => {}
        }
    }

    let draft = draft.ok_or_else(|| AppError::InvalidArgument("missing 'story' part".into()))?;
    let story = state.stories.create(user.as_str(), draft, images).await?;

    Ok(HttpResponse::Created().json(state.views.story(story).await))
}

/// All PUBLIC stories, newest first
pub async fn list_public(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stories = state.stories.all_public().await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn paged_public(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let page = state
        .stories
        .public_page(query.to_request(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story_page(page).await))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let params = query.into_inner();
    let request = PageParams {
        page: params.page,
        size: params.size,
    }
    .to_request(DEFAULT_PAGE_SIZE);

    let page = state.stories.search(&params.q, request).await?;
    Ok(HttpResponse::Ok().json(state.views.story_page(page).await))
}

pub async fn by_user(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let stories = state.stories.by_author(&username).await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn by_hashtag(
    state: web::Data<AppState>,
    tag: web::Path<String>,
) -> Result<HttpResponse> {
    let stories = state.stories.by_hashtag(&tag).await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn by_category(
    state: web::Data<AppState>,
    category: web::Path<String>,
) -> Result<HttpResponse> {
    let stories = state.stories.by_category(Some(category.as_str())).await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn my_private(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let stories = state.stories.my_private(user.as_str()).await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn my_public(state: web::Data<AppState>, user: UserId) -> Result<HttpResponse> {
    let stories = state.stories.my_public(user.as_str()).await?;
    Ok(HttpResponse::Ok().json(state.views.stories(stories).await))
}

pub async fn get_story(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: Option<UserId>,
) -> Result<HttpResponse> {
    let story = state
        .stories
        .get(*id, user.as_ref().map(UserId::as_str))
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story(story).await))
}

pub async fn edit_story(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: UserId,
    req: web::Json<StoryEdit>,
) -> Result<HttpResponse> {
    let story = state
        .stories
        .edit(*id, user.as_str(), req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story(story).await))
}

pub async fn delete_story(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    state.stories.delete(*id, user.as_str()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn toggle_visibility(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    user: UserId,
) -> Result<HttpResponse> {
    let story = state
        .stories
        .toggle_visibility(*id, user.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(state.views.story(story).await))
}
