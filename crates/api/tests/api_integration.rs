//! API integration tests.
//!
//! Each test drives the full router over a mock database whose query results
//! are queued in the order the handlers issue them.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, Value};
use tower::ServiceExt;
use yatube_api::AppState;
use yatube_common::{LocalStorage, config::ListingConfig};
use yatube_core::{
    CommentService, FollowService, GroupService, IndexCache, ListingService, PostService,
    UserService,
};
use yatube_db::entities::{follow, group, post, user};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

const TOKEN: &str = "test-token";
const BOUNDARY: &str = "yatube-test-boundary";

/// Create test app state over a mock database.
fn create_test_state(db: MockDatabase) -> AppState {
    let db = Arc::new(db.into_connection());

    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let follow_repo = FollowRepository::new(Arc::clone(&db));

    let storage = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("yatube-api-tests"),
        "/media".to_string(),
    ));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        group_service: GroupService::new(group_repo.clone()),
        post_service: PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            comment_repo.clone(),
            storage,
        ),
        comment_service: CommentService::new(comment_repo, post_repo.clone(), user_repo.clone()),
        follow_service: FollowService::new(follow_repo.clone(), user_repo.clone()),
        listing_service: ListingService::new(
            post_repo,
            user_repo,
            group_repo,
            follow_repo,
            &ListingConfig::default(),
        ),
        index_cache: IndexCache::new(Duration::from_secs(20)),
        login_url: "/auth/login/".to_string(),
    }
}

fn create_test_app(db: MockDatabase) -> Router {
    yatube_api::app(create_test_state(db))
}

fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn create_test_user(id: &str, username: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: username.to_string(),
        username_lower: username.to_lowercase(),
        name: None,
        password: "hash".to_string(),
        token: Some(TOKEN.to_string()),
        is_admin: false,
        created_at: Utc::now().into(),
    }
}

fn create_test_post(id: &str, author_id: &str, text: &str) -> post::Model {
    post::Model {
        id: id.to_string(),
        text: text.to_string(),
        pub_date: Utc::now().into(),
        author_id: author_id.to_string(),
        group_id: None,
        image: None,
    }
}

fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, Value> {
    maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn authed_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

/// Multipart post form with `text` and an optional PNG `image`.
fn post_form(uri: &str, text: &str, image: Option<&[u8]>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{text}\r\n"
        )
        .as_bytes(),
    );
    if let Some(data) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"small.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without location")
        .to_str()
        .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    image::RgbImage::new(2, 2)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[tokio::test]
async fn test_anonymous_pages_redirect_to_login() {
    let cases = [
        ("GET", "/new/", "/auth/login/?next=%2Fnew%2F"),
        ("GET", "/follow/", "/auth/login/?next=%2Ffollow%2F"),
        ("GET", "/leo/follow/", "/auth/login/?next=%2Fleo%2Ffollow%2F"),
        ("GET", "/leo/unfollow/", "/auth/login/?next=%2Fleo%2Funfollow%2F"),
        ("GET", "/leo/p1/edit/", "/auth/login/?next=%2Fleo%2Fp1%2Fedit%2F"),
        ("POST", "/leo/p1/comment/", "/auth/login/?next=%2Fleo%2Fp1%2Fcomment%2F"),
    ];

    for (method, uri, expected) in cases {
        // No queued results: any query would fail the request
        let app = create_test_app(mock_db());
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND, "{method} {uri}");
        assert_eq!(location(&response), expected, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_login_redirect_keeps_query() {
    let app = create_test_app(mock_db());

    let response = app.oneshot(get("/follow/?page=2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=%2Ffollow%2F%3Fpage%3D2");
}

#[tokio::test]
async fn test_index_lists_posts() {
    let db = mock_db()
        .append_query_results([[count_row(1)]])
        .append_query_results([[create_test_post("p1", "u1", "First post")]])
        .append_query_results([[create_test_user("u1", "leo")]]);
    let app = create_test_app(db);

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["page"]["count"], 1);
    assert_eq!(json["page"]["items"][0]["text"], "First post");
    assert_eq!(json["page"]["items"][0]["author"]["username"], "leo");
}

#[tokio::test]
async fn test_index_is_cached_until_cleared() {
    let db = mock_db()
        // First render
        .append_query_results([[count_row(1)]])
        .append_query_results([[create_test_post("p1", "u1", "Old post")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        // Render after the cache is cleared
        .append_query_results([[count_row(2)]])
        .append_query_results([[
            create_test_post("p2", "u1", "New post"),
            create_test_post("p1", "u1", "Old post"),
        ]])
        .append_query_results([[create_test_user("u1", "leo")]]);
    let state = create_test_state(db);
    let app = yatube_api::app(state.clone());

    let first = app.clone().oneshot(get("/")).await.unwrap();
    let first = to_bytes(first.into_body(), usize::MAX).await.unwrap();

    // A new post exists now, but the cached page is served
    let second = app.clone().oneshot(get("/")).await.unwrap();
    let second = to_bytes(second.into_body(), usize::MAX).await.unwrap();
    assert_eq!(first, second);

    state.index_cache.clear().await;

    let third = app.oneshot(get("/")).await.unwrap();
    let json = body_json(third).await;
    assert_eq!(json["page"]["count"], 2);
    assert_eq!(json["page"]["items"][0]["text"], "New post");
}

#[tokio::test]
async fn test_unknown_path_returns_404() {
    let app = create_test_app(mock_db());

    let response = app.oneshot(get("/no/such/page/here/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_group_returns_404() {
    let db = mock_db().append_query_results([Vec::<group::Model>::new()]);
    let app = create_test_app(db);

    let response = app.oneshot(get("/group/nope/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_post_redirects_to_index() {
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Hello")]]);
    let app = create_test_app(db);

    let response = app.oneshot(post_form("/new/", "Hello", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_new_post_with_image() {
    let mut saved = create_test_post("p1", "u1", "Picture");
    saved.image = Some("posts/u1/small.png".to_string());
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[saved]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(post_form("/new/", "Picture", Some(&png_bytes())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_new_post_blank_text_shows_errors() {
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([Vec::<group::Model>::new()]);
    let app = create_test_app(db);

    let response = app.oneshot(post_form("/new/", "   ", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["edit"], false);
    assert!(json["errors"]["text"].is_array());
}

#[tokio::test]
async fn test_edit_by_non_author_redirects_to_post() {
    let db = mock_db()
        .append_query_results([[create_test_user("u2", "mia")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Mine")]]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_get("/leo/p1/edit/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/leo/p1/");
}

#[tokio::test]
async fn test_edit_form_for_author() {
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Draft")]])
        .append_query_results([Vec::<group::Model>::new()]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_get("/leo/p1/edit/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["edit"], true);
    assert_eq!(json["postId"], "p1");
    assert_eq!(json["text"], "Draft");
}

fn authed_form(uri: &str, content_type: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_new_post_accepts_urlencoded_form() {
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Plain")]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed_form(
            "/new/",
            "application/x-www-form-urlencoded",
            "text=Plain&group=",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_new_post_unreadable_body_shows_form() {
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([Vec::<group::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(authed_form("/new/", "application/json", r#"{"text":"hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["errors"]["form"][0], yatube_api::endpoints::posts::UNREADABLE_FORM);
}

#[tokio::test]
async fn test_edit_post_by_author_redirects_to_post() {
    let updated = create_test_post("p1", "u1", "Edited");
    let db = mock_db()
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Mine")]])
        .append_query_results([[updated]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(post_form("/leo/p1/edit/", "Edited", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/leo/p1/");
}

#[tokio::test]
async fn test_edit_post_by_non_author_changes_nothing() {
    // No update result queued: an update would fail with a server error
    let db = mock_db()
        .append_query_results([[create_test_user("u2", "mia")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Mine")]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(post_form("/leo/p1/edit/", "Hijacked", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/leo/p1/");
}

#[tokio::test]
async fn test_edit_post_by_non_author_without_form_body() {
    let db = mock_db()
        .append_query_results([[create_test_user("u2", "mia")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Mine")]]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_post("/leo/p1/edit/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/leo/p1/");
}

#[tokio::test]
async fn test_token_lookup_failure_is_server_error() {
    let db = mock_db().append_query_errors([DbErr::Custom("connection lost".to_string())]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_get("/new/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_follow_redirects_to_profile() {
    let follow = follow::Model {
        id: "f1".to_string(),
        user_id: "u2".to_string(),
        author_id: "u1".to_string(),
        created_at: Utc::now().into(),
    };
    let db = mock_db()
        .append_query_results([[create_test_user("u2", "mia")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([Vec::<follow::Model>::new()])
        .append_query_results([[follow]]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_get("/leo/follow/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/leo/");
}

#[tokio::test]
async fn test_blank_comment_redirects_without_saving() {
    let db = mock_db()
        .append_query_results([[create_test_user("u2", "mia")]])
        .append_query_results([[create_test_user("u1", "leo")]])
        .append_query_results([[create_test_post("p1", "u1", "Mine")]]);
    let app = create_test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/leo/p1/comment/")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("text=+++"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/leo/p1/");
}

#[tokio::test]
async fn test_clear_cache_requires_admin() {
    let db = mock_db().append_query_results([[create_test_user("u1", "leo")]]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_post("/admin/cache/clear/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_clear_cache_as_admin() {
    let mut admin = create_test_user("u1", "root");
    admin.is_admin = true;
    let db = mock_db().append_query_results([[admin]]);
    let app = create_test_app(db);

    let response = app.oneshot(authed_post("/admin/cache/clear/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_static_pages() {
    for uri in ["/about/author/", "/about/tech/", "/auth/login/?next=%2Fnew%2F"] {
        let app = create_test_app(mock_db());
        let response = app.oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_login_with_unknown_user_is_unauthorized() {
    let db = mock_db().append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username":"ghost","password":"whatever1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
