use std::sync::Arc;

use api_adapters::extract::USER_HEADER;
use api_adapters::handlers::{FeedResponse, LikeResponse};
use api_adapters::router;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use domains::{LikeOutcome, Post, RecordStore, Tier, User, UserTable};
use serde_json::{json, Value};
use services::{FeedOptions, FeedService};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

const ANN: &str = "ann@feed.test";
const BOB: &str = "bob@feed.test";
const ADMIN: &str = "admin@feed.test";

fn user(id: u64, email: &str) -> User {
    User {
        id,
        email: email.into(),
        name: email.into(),
        password_hash: "opaque".into(),
        verified: true,
        tier: Tier::None,
        banned: false,
        created_at: Utc::now(),
        avatar: None,
    }
}

async fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let users: UserTable = [user(1, ANN), user(2, BOB), user(3, ADMIN)]
        .into_iter()
        .map(|u| (u.email.clone(), u))
        .collect();
    store.save_users(&users).await.unwrap();

    let service = FeedService::new(
        store.clone(),
        FeedOptions {
            admin_emails: vec![ADMIN.into()],
            serialize_writes: true,
        },
    );
    (router(Arc::new(service)), store)
}

async fn send(app: &Router, method: Method, uri: &str, as_user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(email) = as_user {
        request = request.header(USER_HEADER, email);
    }
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post_raw(app: &Router, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut request = Request::builder().method(Method::POST).uri(uri).header(USER_HEADER, ANN);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_post(app: &Router, as_user: &str, content: &str) -> Post {
    let (status, body) = send(app, Method::POST, "/posts", Some(as_user), Some(json!({ "content": content }))).await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn like_toggle_and_delete_scenario() {
    let (app, _) = app().await;
    let post = create_post(&app, ANN, "P").await;
    let like_uri = format!("/posts/{}/like", post.id);

    let expect = [(ANN, LikeOutcome::Liked, 1), (ANN, LikeOutcome::Unliked, 0), (BOB, LikeOutcome::Liked, 1)];
    for (who, outcome, count) in expect {
        let (status, body) = send(&app, Method::POST, &like_uri, Some(who), None).await;
        assert_eq!(status, StatusCode::OK);
        let like: LikeResponse = serde_json::from_value(body).unwrap();
        assert_eq!((like.message, like.likes_count), (outcome, count));
    }

    let (status, body) = send(&app, Method::GET, "/posts", Some(BOB), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"][0]["is_liked"], true);

    let (status, _) = send(&app, Method::DELETE, &format!("/posts/{}", post.id), Some(BOB), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &format!("/posts/{}", post.id), Some(ANN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/posts", None, None).await;
    let feed: FeedResponse = serde_json::from_value(body).unwrap();
    assert!(feed.posts.iter().all(|p| p.id != post.id));

    let (status, _) = send(&app, Method::DELETE, &format!("/posts/{}", post.id), Some(ANN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_post_is_bad_request() {
    let (app, store) = app().await;
    let (status, body) = send(&app, Method::POST, "/posts", Some(ANN), Some(json!({ "content": "   ", "attachments": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid content"));
    assert!(store.load_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn comments_nest_in_feed() {
    let (app, _) = app().await;
    let post = create_post(&app, ANN, "P").await;

    let (status, comment) = send(&app, Method::POST, &format!("/posts/{}/comments", post.id), Some(BOB), Some(json!({ "content": "hi" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, feed) = send(&app, Method::GET, "/posts", Some(ANN), None).await;
    assert_eq!(feed["posts"][0]["comments_count"], 1);
    assert_eq!(feed["posts"][0]["comments"][0]["content"], "hi");

    let comment_id = comment["id"].as_u64().unwrap();
    let (status, like) = send(&app, Method::POST, &format!("/comments/{comment_id}/like"), Some(ANN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(like, json!({ "message": "liked", "likes_count": 1 }));

    let (status, _) = send(&app, Method::DELETE, &format!("/comments/{comment_id}"), Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, feed) = send(&app, Method::GET, "/posts", None, None).await;
    assert_eq!(feed["posts"][0]["comments_count"], 0);
    assert_eq!(feed["posts"][0]["comments"], json!([]));
}

#[tokio::test]
async fn identity_and_lookup_failures() {
    let (app, _) = app().await;

    let (status, _) = send(&app, Method::POST, "/posts/1/like", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/posts/1/like", Some("ghost@feed.test"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, "/comments/9/like", Some(ANN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_outage_is_internal_error() {
    let (app, store) = app().await;
    let post = create_post(&app, ANN, "P").await;
    store.set_offline(true);

    let (status, body) = send(&app, Method::POST, &format!("/posts/{}/like", post.id), Some(ANN), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("storage unavailable"));
}

#[tokio::test]
async fn registration_and_admin_routes() {
    let (app, _) = app().await;

    let (status, body) = send(&app, Method::POST, "/users", None, Some(json!({ "email": "cy@feed.test", "name": "Cy", "password_hash": "h" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("password_hash").is_none());

    let (status, _) = send(&app, Method::POST, "/users", None, Some(json!({ "email": "cy@feed.test", "name": "Cy", "password_hash": "h" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::POST, "/admin/users/cy@feed.test/ban", Some(ANN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::POST, "/admin/users/cy@feed.test/ban", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["banned"], true);

    let (status, _) = send(&app, Method::POST, "/posts", Some("cy@feed.test"), Some(json!({ "content": "spam" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::PUT, "/admin/users/cy@feed.test/tier", Some(ADMIN), Some(json!({ "tier": "premium" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "premium");

    let (status, body) = send(&app, Method::GET, "/admin/counters", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drifts"], json!([]));
}

#[tokio::test]
async fn null_fields_count_as_empty_content() {
    let (app, store) = app().await;

    for body in [json!({ "content": "", "attachments": null }), json!({ "content": null })] {
        let (status, reply) = send(&app, Method::POST, "/posts", Some(ANN), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"].as_str().unwrap().contains("invalid content"));
    }

    let (status, post) = send(&app, Method::POST, "/posts", Some(ANN), Some(json!({ "content": "hi", "attachments": null }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["attachments"], json!([]));
    assert_eq!(store.load_posts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreadable_bodies_answer_with_json_errors() {
    let (app, store) = app().await;
    let post = create_post(&app, ANN, "P").await;
    let comments_uri = format!("/posts/{}/comments", post.id);

    let cases = [
        ("/posts", None, r#"{"content":"no type"}"#),
        ("/posts", Some("application/json"), r#"{"content":"#),
        ("/posts", Some("application/json"), r#"{"content":42}"#),
        (comments_uri.as_str(), None, r#"{"content":"no type"}"#),
        (comments_uri.as_str(), Some("application/json"), "not json"),
    ];
    for (uri, content_type, body) in cases {
        let (status, reply) = post_raw(&app, uri, content_type, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {content_type:?} {body}");
        assert!(reply["error"].is_string(), "{reply}");
    }

    assert_eq!(store.load_posts().await.unwrap().len(), 1);
    assert!(store.load_comments().await.unwrap().is_empty());
}
