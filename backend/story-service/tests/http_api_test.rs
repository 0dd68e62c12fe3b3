//! Integration Tests: HTTP API
//!
//! Exercises the `/api/v1` routes through actix-web's test service with the
//! JWT middleware in front, backed by in-memory storage.
//!
//! Coverage:
//! - Multipart story creation with image upload
//! - Visibility rules on single-story reads
//! - Comments, reactions and comment paging
//! - Ranking endpoints
//! - Bookmarks
//! - Authentication failures
//! - Health probes

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::{bearer, harness, validator};
use serde_json::{json, Value};
use story_service::handlers::configure;
use story_service::middleware::JwtAuthMiddleware;

const BOUNDARY: &str = "story-test-boundary";

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new().app_data(web::Data::new($state)).service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(validator()))
                    .configure(configure),
            ),
        )
        .await
    };
}

fn multipart_body(story: &Value, image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"story\"\r\nContent-Type: application/json\r\n\r\n{story}\r\n"
        )
        .as_bytes(),
    );
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn create_request(user: &str, story: Value, image: Option<(&str, &[u8])>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/stories")
        .insert_header((header::AUTHORIZATION, bearer(user)))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(&story, image))
}

#[actix_web::test]
async fn test_create_story_with_image() {
    let h = harness();
    let uploader = h.uploader.clone();
    let app = test_app!(h.state);

    let req = create_request(
        "alice",
        json!({"title": "Sunrise", "content": "new day #hope #Hope", "category": "HEALING"}),
        Some(("sun.png", b"\x89PNG fake")),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Sunrise");
    assert_eq!(body["category"], "HEALING");
    assert_eq!(body["visibility"], "PUBLIC");
    assert_eq!(body["hashtags"], json!(["hope"]));
    assert_eq!(body["imageUrls"], json!(["https://cdn.test/sun.png"]));
    assert_eq!(body["userId"], "alice");
    assert_eq!(body["user"]["profileImageUrl"], "https://img.test/alice.png");
    assert_eq!(body["reactionsCount"], 0);
    assert!(body.get("reactionCount").is_none());
    assert_eq!(uploader.uploaded(), vec!["sun.png".to_string()]);
}

#[actix_web::test]
async fn test_create_requires_authentication() {
    let h = harness();
    let app = test_app!(h.state);

    let req = test::TestRequest::post()
        .uri("/api/v1/stories")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body(&json!({"title": "t", "content": "c"}), None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_invalid_token_rejected() {
    let h = harness();
    let app = test_app!(h.state);

    let req = test::TestRequest::get()
        .uri("/api/v1/stories")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();

    let status = match test::try_call_service(&app, req).await {
        Ok(resp) => resp.status(),
        Err(e) => e.error_response().status(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_private_story_visibility() {
    let h = harness();
    let app = test_app!(h.state);

    let req = create_request(
        "alice",
        json!({"title": "Diary", "content": "only me", "visibility": "PRIVATE"}),
        None,
    )
    .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/v1/stories/{}", created["id"].as_str().unwrap());

    let anonymous = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, anonymous).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let stranger = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .to_request();
    let resp = test::call_service(&app, stranger).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let owner = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .to_request();
    let resp = test::call_service(&app, owner).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // private stories accept no comments
    let comment = test::TestRequest::post()
        .uri(&format!("{uri}/comments"))
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .set_json(json!({"text": "note to self"}))
        .to_request();
    let resp = test::call_service(&app, comment).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let mine = test::TestRequest::get()
        .uri("/api/v1/stories/my/private")
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, mine).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_comments_reactions_and_feed() {
    let h = harness();
    let app = test_app!(h.state);

    let req = create_request(
        "alice",
        json!({"title": "Healing", "content": "step by step #hope", "category": "HEALING"}),
        None,
    )
    .to_request();
    let healing: Value = test::call_and_read_body_json(&app, req).await;
    let healing_id = healing["id"].as_str().unwrap().to_string();

    let req = create_request(
        "carol",
        json!({"title": "Later", "content": "newer story", "category": "LIFE"}),
        None,
    )
    .to_request();
    let newer: Value = test::call_and_read_body_json(&app, req).await;
    let newer_id = newer["id"].as_str().unwrap().to_string();

    let comment = test::TestRequest::post()
        .uri(&format!("/api/v1/stories/{healing_id}/comments"))
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .set_json(json!({"text": "thank you"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, comment).await;
    assert_eq!(body["commentCount"], 1);
    assert_eq!(body["comments"][0]["userId"], "bob");
    assert_eq!(body["comments"][0]["username"], "bob");
    assert!(body["comments"][0].get("user").is_none());

    // no body: defaults to LIKE
    let react = test::TestRequest::post()
        .uri(&format!("/api/v1/stories/{healing_id}/reactions"))
        .insert_header((header::AUTHORIZATION, bearer("carol")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, react).await;
    assert_eq!(body["reactionsCount"], 1);

    let blank = test::TestRequest::post()
        .uri(&format!("/api/v1/stories/{healing_id}/comments"))
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .set_json(json!({"text": "   "}))
        .to_request();
    let resp = test::call_service(&app, blank).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let paged = test::TestRequest::get()
        .uri(&format!("/api/v1/stories/{healing_id}/comments/paged?page=0&size=5"))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, paged).await;
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["number"], 0);
    assert_eq!(page["first"], true);
    assert_eq!(page["last"], true);
    assert_eq!(page["content"][0]["text"], "thank you");
    assert_eq!(page["content"][0]["username"], "bob");

    // bob learned HEALING, #hope and alice; the older story ranks first
    let feed = test::TestRequest::get()
        .uri("/api/v1/stories/feed")
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .to_request();
    let feed: Value = test::call_and_read_body_json(&app, feed).await;
    assert_eq!(feed[0]["id"], healing_id.as_str());
    assert_eq!(feed[1]["id"], newer_id.as_str());

    // without a viewer the feed is newest first
    let anonymous = test::TestRequest::get().uri("/api/v1/stories/feed").to_request();
    let feed: Value = test::call_and_read_body_json(&app, anonymous).await;
    assert_eq!(feed[0]["id"], newer_id.as_str());

    let trending = test::TestRequest::get()
        .uri("/api/v1/stories/trending")
        .to_request();
    let trending: Value = test::call_and_read_body_json(&app, trending).await;
    assert_eq!(trending[0]["id"], healing_id.as_str());

    let most_liked = test::TestRequest::get()
        .uri("/api/v1/stories/most-liked")
        .to_request();
    let most_liked: Value = test::call_and_read_body_json(&app, most_liked).await;
    assert_eq!(most_liked[0]["id"], healing_id.as_str());

    let by_tag = test::TestRequest::get()
        .uri("/api/v1/stories/hashtag/hope")
        .to_request();
    let by_tag: Value = test::call_and_read_body_json(&app, by_tag).await;
    assert_eq!(by_tag.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_bookmarks_toggle_and_list() {
    let h = harness();
    let app = test_app!(h.state);

    let req = create_request("alice", json!({"title": "Keep", "content": "me"}), None).to_request();
    let story: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/v1/bookmarks/{}", story["id"].as_str().unwrap());

    let toggle = test::TestRequest::post()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, toggle).await;
    assert_eq!(body, json!({"bookmarked": true}));

    let mine = test::TestRequest::get()
        .uri("/api/v1/bookmarks/me")
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, mine).await;
    assert_eq!(listed[0]["id"], story["id"]);

    let toggle = test::TestRequest::post()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, toggle).await;
    assert_eq!(body, json!({"bookmarked": false}));

    let missing = test::TestRequest::post()
        .uri(&format!("/api/v1/bookmarks/{}", uuid::Uuid::new_v4()))
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .to_request();
    let resp = test::call_service(&app, missing).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_owner_only_mutations() {
    let h = harness();
    let app = test_app!(h.state);

    let req = create_request("alice", json!({"title": "Mine", "content": "x"}), None).to_request();
    let story: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/api/v1/stories/{}", story["id"].as_str().unwrap());

    let edit = test::TestRequest::put()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("bob")))
        .set_json(json!({"title": "Hijacked"}))
        .to_request();
    let resp = test::call_service(&app, edit).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let flip = test::TestRequest::patch()
        .uri(&format!("{uri}/visibility"))
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, flip).await;
    assert_eq!(body["visibility"], "PRIVATE");

    let delete = test::TestRequest::delete()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .to_request();
    let resp = test::call_service(&app, delete).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let gone = test::TestRequest::get()
        .uri(&uri)
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .to_request();
    let resp = test::call_service(&app, gone).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_health_probes() {
    let h = harness();
    let app = test_app!(h.state);

    for uri in ["/api/v1/health", "/api/v1/health/live", "/api/v1/health/ready"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}

#[actix_web::test]
async fn test_anonymous_story_stays_unattributed() {
    let h = harness();
    let app = test_app!(h.state);

    let req = create_request(
        "alice",
        json!({"title": "Confession", "content": "nobody knows", "anonymous": true}),
        None,
    )
    .to_request();
    let secret: Value = test::call_and_read_body_json(&app, req).await;
    let secret_id = secret["id"].as_str().unwrap().to_string();
    assert!(secret.get("userId").is_none());

    let req = create_request("alice", json!({"title": "Signed", "content": "hi"}), None).to_request();
    let signed: Value = test::call_and_read_body_json(&app, req).await;

    let by_user = test::TestRequest::get()
        .uri("/api/v1/stories/user/alice")
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, by_user).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], signed["id"]);

    // the owner replying on their anonymous story is not revealed either
    let comment = test::TestRequest::post()
        .uri(&format!("/api/v1/stories/{secret_id}/comments"))
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .set_json(json!({"text": "thanks for reading"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, comment).await;
    let reply = &body["comments"][0];
    assert_eq!(reply["text"], "thanks for reading");
    assert!(reply.get("userId").is_none());
    assert!(reply.get("username").is_none());

    let paged = test::TestRequest::get()
        .uri(&format!("/api/v1/stories/{secret_id}/comments/paged"))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, paged).await;
    assert!(page["content"][0].get("userId").is_none());

    let mine = test::TestRequest::get()
        .uri("/api/v1/stories/my/public")
        .insert_header((header::AUTHORIZATION, bearer("alice")))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, mine).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
}
