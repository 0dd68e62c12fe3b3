use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::db::{PageRequest, StoryQuery};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "story-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "alive" }))
}

/// Ready when the story store answers a one-row query.
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    match state
        .store
        .find(&StoryQuery::public(), PageRequest::first(1))
        .await
    {
        Ok(_) => HttpResponse::Ok().json(json!({ "status": "ready" })),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "error": e.to_string(),
            }))
        }
    }
}
