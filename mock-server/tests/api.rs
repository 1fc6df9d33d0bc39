use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_db, seed_account, seed_post, Db, PostBody, TokenBody, UserBody};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

fn authed_json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn register_returns_201_with_a_token() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            r#"{"name":"Ada","email":"ada@b.com","password":"pw"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let grant: TokenBody = body_json(resp).await;
    assert!(!grant.token.is_empty());
}

#[tokio::test]
async fn register_duplicate_email_is_rejected() {
    let db = Db::default();
    seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(json_request(
            "POST",
            "/auth/register",
            r#"{"name":"Other","email":"ada@b.com","password":"pw2"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Email already registered");
}

#[tokio::test]
async fn register_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/auth/register", r#"{"name":"Ada"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn login_issues_a_fresh_token() {
    let db = Db::default();
    seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(json_request(
            "POST",
            "/auth/login",
            r#"{"email":"ada@b.com","password":"pw"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let grant: TokenBody = body_json(resp).await;
    assert!(grant.token.starts_with("tok-"));
}

#[tokio::test]
async fn login_wrong_password_is_401_with_detail() {
    let db = Db::default();
    seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(json_request(
            "POST",
            "/auth/login",
            r#"{"email":"ada@b.com","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Invalid credentials");
}

#[tokio::test]
async fn me_without_a_token_is_401() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Not authenticated");
}

#[tokio::test]
async fn me_resolves_the_token_owner() {
    let db = Db::default();
    let (id, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(authed_request("GET", "/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: UserBody = body_json(resp).await;
    assert_eq!(user.id, id);
    assert_eq!(user.name, "Ada");
    assert_eq!(user.email, "ada@b.com");
}

#[tokio::test]
async fn unknown_token_is_401() {
    let resp = app()
        .oneshot(authed_request("GET", "/auth/me", "tok-forged"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- posts ---

#[tokio::test]
async fn feed_requires_auth() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/posts/")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_post_starts_with_zero_counts() {
    let db = Db::default();
    let (_, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(authed_json_request(
            "POST",
            "/posts/",
            &token,
            r#"{"content":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: PostBody = body_json(resp).await;
    assert_eq!(post.content, "hello");
    assert_eq!(post.likes, 0);
    assert_eq!(post.comments, 0);
    assert!(!post.is_liked);
    assert_eq!(post.author.name, "Ada");
}

#[tokio::test]
async fn feed_lists_newest_first() {
    use tower::Service;

    let db = Db::default();
    let (_, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let mut app = app_with_db(db).into_service();

    for content in [r#"{"content":"first"}"#, r#"{"content":"second"}"#] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(authed_json_request("POST", "/posts/", &token, content))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_request("GET", "/posts/", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<PostBody> = body_json(resp).await;
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].content, "second");
    assert_eq!(posts[1].content, "first");
}

// --- likes ---

#[tokio::test]
async fn like_and_unlike_are_idempotent() {
    use tower::Service;

    let db = Db::default();
    let (id, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let post_id = seed_post(&db, &id, "hello").await.unwrap();
    let mut app = app_with_db(db).into_service();

    let like_uri = format!("/posts/{post_id}/like/");
    for _ in 0..2 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(authed_request("POST", &like_uri, &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(body_bytes(resp).await.is_empty());
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_request("GET", "/posts/", &token))
        .await
        .unwrap();
    let posts: Vec<PostBody> = body_json(resp).await;
    assert_eq!(posts[0].likes, 1, "double like counts once");
    assert!(posts[0].is_liked);

    for _ in 0..2 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(authed_request("DELETE", &like_uri, &token))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_request("GET", "/posts/", &token))
        .await
        .unwrap();
    let posts: Vec<PostBody> = body_json(resp).await;
    assert_eq!(posts[0].likes, 0);
    assert!(!posts[0].is_liked);
}

#[tokio::test]
async fn like_unknown_post_is_404() {
    let db = Db::default();
    let (_, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(authed_request("POST", "/posts/missing/like/", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "Post not found");
}

#[tokio::test]
async fn is_liked_is_per_viewer() {
    use tower::Service;

    let db = Db::default();
    let (ada_id, ada_token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let (_, bob_token) = seed_account(&db, "Bob", "bob@b.com", "pw").await;
    let post_id = seed_post(&db, &ada_id, "hello").await.unwrap();
    let mut app = app_with_db(db).into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_request(
            "POST",
            &format!("/posts/{post_id}/like/"),
            &bob_token,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_request("GET", "/posts/", &bob_token))
        .await
        .unwrap();
    let posts: Vec<PostBody> = body_json(resp).await;
    assert!(posts[0].is_liked, "the liker sees the flag");
    assert_eq!(posts[0].likes, 1);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed_request("GET", "/posts/", &ada_token))
        .await
        .unwrap();
    let posts: Vec<PostBody> = body_json(resp).await;
    assert!(!posts[0].is_liked, "the author does not");
    assert_eq!(posts[0].likes, 1);
}

// --- users ---

#[tokio::test]
async fn get_user_returns_the_snapshot() {
    let db = Db::default();
    let (id, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(authed_request("GET", &format!("/users/{id}"), &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: UserBody = body_json(resp).await;
    assert_eq!(user.id, id);
}

#[tokio::test]
async fn get_unknown_user_is_404() {
    let db = Db::default();
    let (_, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let resp = app_with_db(db)
        .oneshot(authed_request("GET", "/users/missing", &token))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn user_posts_lists_only_that_author() {
    let db = Db::default();
    let (ada_id, token) = seed_account(&db, "Ada", "ada@b.com", "pw").await;
    let (bob_id, _) = seed_account(&db, "Bob", "bob@b.com", "pw").await;
    seed_post(&db, &ada_id, "from ada").await.unwrap();
    seed_post(&db, &bob_id, "from bob").await.unwrap();
    seed_post(&db, &ada_id, "ada again").await.unwrap();

    let resp = app_with_db(db)
        .oneshot(authed_request(
            "GET",
            &format!("/users/{ada_id}/posts/"),
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let posts: Vec<PostBody> = body_json(resp).await;
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].content, "ada again", "newest first");
    assert_eq!(posts[1].content, "from ada");
    assert!(posts.iter().all(|p| p.author.id == ada_id));
}
