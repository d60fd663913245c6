//! API integration tests.
//!
//! These drive the full router against an in-memory SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use yatube_api::{AppState, app};
use yatube_common::{IdGenerator, LocalStorage, StorageBackend};
use yatube_core::{
    CommentService, FeedService, FollowService, GroupService, ListingService, MemoryListingCache,
    PostService, ProvisionUserInput, UserService,
};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use yatube_db::test_utils::TestDatabase;

const MAX_UPLOAD_BYTES: usize = 1024;

struct TestApp {
    _db: TestDatabase,
    media_dir: PathBuf,
    state: AppState,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_dir);
    }
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = db.connection();

        let media_dir =
            std::env::temp_dir().join(format!("yatube-api-{}", IdGenerator::new().generate()));
        let storage: Arc<dyn StorageBackend> =
            Arc::new(LocalStorage::new(media_dir.clone(), "/media".to_string()));

        let user_repo = UserRepository::new(Arc::clone(&conn));
        let group_repo = GroupRepository::new(Arc::clone(&conn));
        let post_repo = PostRepository::new(Arc::clone(&conn));
        let comment_repo = CommentRepository::new(Arc::clone(&conn));
        let follow_repo = FollowRepository::new(Arc::clone(&conn));

        let post_service = PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            storage.clone(),
        );

        let state = AppState {
            user_service: UserService::new(user_repo.clone()),
            group_service: GroupService::new(group_repo),
            comment_service: CommentService::new(comment_repo, post_repo, user_repo.clone()),
            follow_service: FollowService::new(follow_repo, user_repo),
            feed_service: FeedService::new(post_service.clone()),
            listing_service: ListingService::new(
                post_service.clone(),
                Arc::new(MemoryListingCache::new()),
                Duration::from_secs(1200),
            ),
            post_service,
            storage,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        };

        Self {
            _db: db,
            media_dir,
            state,
        }
    }

    fn router(&self) -> Router {
        app(self.state.clone())
    }

    /// Provision a user and return their access token.
    async fn user(&self, username: &str, is_admin: bool) -> String {
        self.state
            .user_service
            .provision(ProvisionUserInput {
                username: username.to_string(),
                name: None,
                is_admin,
            })
            .await
            .unwrap()
            .token
            .unwrap()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, token, Body::empty())).await
    }

    async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut req = request("POST", uri, token, Body::from(body.to_string()));
        req.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        self.send(req).await
    }

    async fn publish(&self, token: &str, text: &str) -> String {
        let (status, body) = self
            .post_json("/api/create", Some(token), json!({ "text": text }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["post"]["id"].as_str().unwrap().to_string()
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

#[tokio::test]
async fn test_index_is_empty_single_page() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/", None).await;

    assert_eq!(status, StatusCode::OK);
    let page = &body["data"]["page_obj"];
    assert_eq!(page["object_list"], json!([]));
    assert_eq!(page["number"], 1);
    assert_eq!(page["num_pages"], 1);
    assert_eq!(page["has_next"], false);
}

#[tokio::test]
async fn test_index_serves_cached_page_until_flush() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let admin = app.user("admin", true).await;
    app.publish(&leo, "First post here").await;

    let (_, before) = app.get("/api/", None).await;
    assert_eq!(before["data"]["page_obj"]["count"], 1);

    app.publish(&leo, "Second post here").await;
    let (_, cached) = app.get("/api/", None).await;
    assert_eq!(cached, before);

    let (status, _) = app.post_json("/api/admin/cache/flush", Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, after) = app.get("/api/", None).await;
    assert_eq!(after["data"]["page_obj"]["count"], 2);
}

#[tokio::test]
async fn test_pagination_clamps_out_of_range_pages() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    for i in 0..13 {
        app.publish(&leo, &format!("Post number {i}")).await;
    }

    let (_, first) = app.get("/api/profile/leo", None).await;
    let (_, second) = app.get("/api/profile/leo?page=2", None).await;
    let (_, beyond) = app.get("/api/profile/leo?page=3", None).await;
    let (_, junk) = app.get("/api/profile/leo?page=abc", None).await;

    assert_eq!(first["data"]["page_obj"]["object_list"].as_array().unwrap().len(), 10);
    assert_eq!(second["data"]["page_obj"]["object_list"].as_array().unwrap().len(), 3);
    assert_eq!(beyond["data"]["page_obj"], second["data"]["page_obj"]);
    assert_eq!(junk["data"]["page_obj"], first["data"]["page_obj"]);
}

#[tokio::test]
async fn test_create_requires_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/api/create", None, json!({ "text": "Hello world" }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_rejects_repetitive_text() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;

    let (status, body) = app
        .post_json("/api/create", Some(&leo), json!({ "text": "aaa" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "text");
    assert_eq!(body["error"]["message"], "Write something more meaningful.");
}

#[tokio::test]
async fn test_create_form_lists_groups() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let admin = app.user("admin", true).await;
    app.post_json("/api/admin/groups", Some(&admin), json!({ "title": "Cats" }))
        .await;

    let (status, body) = app.get("/api/create", Some(&leo)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_edit"], false);
    let fields = body["data"]["form"]["fields"].as_array().unwrap();
    let group = fields.iter().find(|f| f["name"] == "group").unwrap();
    assert_eq!(group["choices"][0]["label"], "Cats");
}

#[tokio::test]
async fn test_group_page_lists_group_posts() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let admin = app.user("admin", true).await;

    let (status, group) = app
        .post_json("/api/admin/groups", Some(&admin), json!({ "title": "Лев Толстой" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["data"]["slug"], "lev-tolstoi");
    let group_id = group["data"]["id"].as_str().unwrap();

    app.post_json(
        "/api/create",
        Some(&leo),
        json!({ "text": "In the group", "group": group_id }),
    )
    .await;
    app.publish(&leo, "Outside the group").await;

    let (status, body) = app.get("/api/group/lev-tolstoi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["group"]["title"], "Лев Толстой");
    let posts = body["data"]["page_obj"]["object_list"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["text"], "In the group");

    let (status, _) = app.get("/api/group/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_group_slug_conflicts() {
    let app = TestApp::new().await;
    let admin = app.user("admin", true).await;

    app.post_json("/api/admin/groups", Some(&admin), json!({ "title": "Cats" }))
        .await;
    let (status, body) = app
        .post_json("/api/admin/groups", Some(&admin), json!({ "title": "Cats" }))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;

    let (status, _) = app
        .post_json("/api/admin/groups", Some(&leo), json!({ "title": "Cats" }))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_post_detail_shows_comments_newest_first() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let anna = app.user("anna", false).await;
    let post_id = app.publish(&leo, "Hello world").await;

    let uri = format!("/api/posts/{post_id}/comment");
    let (status, _) = app.post_json(&uri, Some(&anna), json!({ "text": "First" })).await;
    assert_eq!(status, StatusCode::CREATED);
    app.post_json(&uri, Some(&leo), json!({ "text": "Second" })).await;

    let (status, body) = app.get(&format!("/api/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["post"]["text"], "Hello world");
    assert_eq!(body["data"]["comments"][0]["text"], "Second");
    assert_eq!(body["data"]["comments"][1]["author"]["username"], "anna");
    assert_eq!(body["data"]["form"]["action"], uri);
}

#[tokio::test]
async fn test_anonymous_comment_is_refused() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let post_id = app.publish(&leo, "Hello world").await;

    let (status, _) = app
        .post_json(&format!("/api/posts/{post_id}/comment"), None, json!({ "text": "Hi" }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_author_edits_post() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let post_id = app.publish(&leo, "Original text").await;
    let uri = format!("/api/posts/{post_id}/edit");

    let (status, form) = app.get(&uri, Some(&leo)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(form["data"]["is_edit"], true);
    assert_eq!(form["data"]["form"]["fields"][0]["initial"], "Original text");

    let (status, body) = app.post_json(&uri, Some(&leo), json!({ "text": "Edited text" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["post"]["text"], "Edited text");
}

#[tokio::test]
async fn test_non_author_edit_redirects_to_detail() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let anna = app.user("anna", false).await;
    let post_id = app.publish(&leo, "Original text").await;
    let uri = format!("/api/posts/{post_id}/edit");

    let response = app
        .router()
        .oneshot(request("GET", &uri, Some(&anna), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("/api/posts/{post_id}").as_str()
    );

    let (status, _) = app.post_json(&uri, Some(&anna), json!({ "text": "Hijacked" })).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, detail) = app.get(&format!("/api/posts/{post_id}"), None).await;
    assert_eq!(detail["data"]["post"]["text"], "Original text");
}

#[tokio::test]
async fn test_follow_flow_and_feed() {
    let app = TestApp::new().await;
    let reader = app.user("reader", false).await;
    let leo = app.user("leo", false).await;
    app.publish(&leo, "Leo writes").await;

    let (_, profile) = app.get("/api/profile/leo", Some(&reader)).await;
    assert_eq!(profile["data"]["following"], false);

    let (status, body) = app
        .post_json("/api/profile/leo/follow", Some(&reader), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["following"], true);
    app.post_json("/api/profile/leo/follow", Some(&reader), json!({}))
        .await;

    let (_, profile) = app.get("/api/profile/leo", Some(&reader)).await;
    assert_eq!(profile["data"]["following"], true);

    let (_, feed) = app.get("/api/follow", Some(&reader)).await;
    assert_eq!(feed["data"]["page_obj"]["count"], 1);

    app.post_json("/api/profile/leo/unfollow", Some(&reader), json!({}))
        .await;
    let (_, feed) = app.get("/api/follow", Some(&reader)).await;
    assert_eq!(feed["data"]["page_obj"]["count"], 0);
}

#[tokio::test]
async fn test_anonymous_profile_is_not_following() {
    let app = TestApp::new().await;
    app.user("leo", false).await;

    let (status, body) = app.get("/api/profile/leo", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["author"]["username"], "leo");
    assert_eq!(body["data"]["following"], false);
}

#[tokio::test]
async fn test_feed_requires_token() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/follow", Some("not-a-token")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn multipart(content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "yatube-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"small.gif\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn upload(app: &TestApp, token: &str, content_type: &str, data: &[u8]) -> (StatusCode, Value) {
    let (header_value, body) = multipart(content_type, data);
    let mut req = request("POST", "/api/media", Some(token), Body::from(body));
    req.headers_mut()
        .insert(header::CONTENT_TYPE, header_value.parse().unwrap());
    app.send(req).await
}

#[tokio::test]
async fn test_post_with_uploaded_image() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;

    let (status, media) = upload(&app, &leo, "image/gif", b"GIF89a\x01\x00\x01\x00").await;
    assert_eq!(status, StatusCode::CREATED, "{media}");
    let key = media["data"]["key"].as_str().unwrap();

    let (status, body) = app
        .post_json(
            "/api/create",
            Some(&leo),
            json!({ "text": "With a picture", "image": key }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["post"]["image"], key);
    assert_eq!(body["data"]["post"]["image_url"], format!("/media/{key}"));
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;

    let (status, body) = upload(&app, &leo, "text/plain", b"hello").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "image");
}

#[tokio::test]
async fn test_upload_rejects_oversized_images() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;

    let (status, _) = upload(&app, &leo, "image/gif", &vec![0u8; MAX_UPLOAD_BYTES + 1]).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_foreign_image_key_is_rejected() {
    let app = TestApp::new().await;
    let leo = app.user("leo", false).await;
    let anna = app.user("anna", false).await;
    let (_, media) = upload(&app, &anna, "image/gif", b"GIF89a\x01\x00\x01\x00").await;

    let (status, body) = app
        .post_json(
            "/api/create",
            Some(&leo),
            json!({ "text": "Borrowed picture", "image": media["data"]["key"] }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "image");
}

#[tokio::test]
async fn test_admin_deletes_author_and_their_posts() {
    let app = TestApp::new().await;
    let admin = app.user("admin", true).await;
    let leo = app.user("leo", false).await;
    app.publish(&leo, "Soon gone").await;

    let response = app
        .router()
        .oneshot(request("DELETE", "/api/admin/users/leo", Some(&admin), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/profile/leo", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_provisions_user_with_token() {
    let app = TestApp::new().await;
    let admin = app.user("admin", true).await;

    let (status, body) = app
        .post_json("/api/admin/users", Some(&admin), json!({ "username": "anna" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = app.get("/api/create", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/nonexistent/endpoint", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = app.get("/api/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_post_returns_404() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/posts/missing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "POST_NOT_FOUND");
}
