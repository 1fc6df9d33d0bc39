//! In-memory ThreadSpace backend for integration tests and local hosts.
//!
//! Speaks the same REST contract as the production API: bearer-token auth,
//! FastAPI-style `{"detail": ...}` error bodies, Mongo-style `_id` fields,
//! feeds ordered newest first, idempotent like/unlike. State lives in a
//! shared in-memory map and is gone when the process exits.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostBody {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub comments: u32,
    #[serde(rename = "isLiked")]
    pub is_liked: bool,
    pub author: AuthorBody,
}

#[derive(Serialize, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Deserialize)]
pub struct Register {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub content: String,
}

#[derive(Clone, Debug)]
struct UserRecord {
    id: String,
    name: String,
    email: String,
    password: String,
    title: Option<String>,
}

#[derive(Clone, Debug)]
struct PostRecord {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
    comments: u32,
    author: AuthorBody,
    liked_by: HashSet<String>,
}

/// Users and tokens keyed by id/value; posts in insertion order (the feed
/// serves them reversed).
#[derive(Default)]
pub struct AppState {
    users: HashMap<String, UserRecord>,
    posts: Vec<PostRecord>,
    tokens: HashMap<String, String>,
}

pub type Db = Arc<RwLock<AppState>>;

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

type ApiFailure = (StatusCode, Json<ErrorBody>);

fn failure(status: StatusCode, detail: &str) -> ApiFailure {
    (
        status,
        Json(ErrorBody {
            detail: detail.to_string(),
        }),
    )
}

pub fn app() -> Router {
    app_with_db(Db::default())
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/posts/", get(list_posts).post(create_post))
        .route("/posts/{id}/like/", post(like_post).delete(unlike_post))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/posts/", get(list_user_posts))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Insert an account directly, bypassing the register endpoint. Returns the
/// user id and a valid token, so tests can start from a known state.
pub async fn seed_account(db: &Db, name: &str, email: &str, password: &str) -> (String, String) {
    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        title: None,
    };
    let token = mint_token();
    let id = user.id.clone();
    let mut state = db.write().await;
    state.tokens.insert(token.clone(), id.clone());
    state.users.insert(id.clone(), user);
    (id, token)
}

/// Insert a post authored by `author_id`. Returns the post id.
pub async fn seed_post(db: &Db, author_id: &str, content: &str) -> Option<String> {
    let mut state = db.write().await;
    let author = author_body(state.users.get(author_id)?);
    let post = PostRecord {
        id: Uuid::new_v4().to_string(),
        content: content.to_string(),
        created_at: Utc::now(),
        comments: 0,
        author,
        liked_by: HashSet::new(),
    };
    let id = post.id.clone();
    state.posts.push(post);
    Some(id)
}

fn mint_token() -> String {
    format!("tok-{}", Uuid::new_v4().simple())
}

fn user_body(user: &UserRecord) -> UserBody {
    UserBody {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        title: user.title.clone(),
        bio: None,
        avatar_url: None,
    }
}

fn author_body(user: &UserRecord) -> AuthorBody {
    AuthorBody {
        id: user.id.clone(),
        name: user.name.clone(),
        title: user.title.clone(),
        avatar_url: None,
    }
}

fn post_body(post: &PostRecord, viewer: &str) -> PostBody {
    PostBody {
        id: post.id.clone(),
        content: post.content.clone(),
        created_at: post.created_at,
        likes: post.liked_by.len() as u32,
        comments: post.comments,
        is_liked: post.liked_by.contains(viewer),
        author: post.author.clone(),
    }
}

/// Resolve the bearer token to its user, or fail with 401.
async fn authenticate(db: &Db, headers: &HeaderMap) -> Result<UserRecord, ApiFailure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    let state = db.read().await;
    let user_id = state
        .tokens
        .get(token)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;
    state
        .users
        .get(user_id)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid or expired token"))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Register>,
) -> Result<(StatusCode, Json<TokenBody>), ApiFailure> {
    let mut state = db.write().await;
    if state.users.values().any(|u| u.email == input.email) {
        return Err(failure(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        email: input.email,
        password: input.password,
        title: None,
    };
    let token = mint_token();
    state.tokens.insert(token.clone(), user.id.clone());
    state.users.insert(user.id.clone(), user);
    Ok((StatusCode::CREATED, Json(TokenBody { token })))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Login>,
) -> Result<Json<TokenBody>, ApiFailure> {
    let mut state = db.write().await;
    let user = state
        .users
        .values()
        .find(|u| u.email == input.email && u.password == input.password)
        .cloned()
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
    let token = mint_token();
    state.tokens.insert(token.clone(), user.id);
    Ok(Json(TokenBody { token }))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<UserBody>, ApiFailure> {
    let user = authenticate(&db, &headers).await?;
    Ok(Json(user_body(&user)))
}

async fn list_posts(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<PostBody>>, ApiFailure> {
    let viewer = authenticate(&db, &headers).await?;
    let state = db.read().await;
    let posts = state
        .posts
        .iter()
        .rev()
        .map(|p| post_body(p, &viewer.id))
        .collect();
    Ok(Json(posts))
}

async fn create_post(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreatePost>,
) -> Result<(StatusCode, Json<PostBody>), ApiFailure> {
    let viewer = authenticate(&db, &headers).await?;
    let post = PostRecord {
        id: Uuid::new_v4().to_string(),
        content: input.content,
        created_at: Utc::now(),
        comments: 0,
        author: author_body(&viewer),
        liked_by: HashSet::new(),
    };
    let body = post_body(&post, &viewer.id);
    db.write().await.posts.push(post);
    Ok((StatusCode::CREATED, Json(body)))
}

async fn like_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiFailure> {
    let viewer = authenticate(&db, &headers).await?;
    let mut state = db.write().await;
    let post = state
        .posts
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Post not found"))?;
    // liking twice is a no-op, not an error
    post.liked_by.insert(viewer.id);
    Ok(StatusCode::NO_CONTENT)
}

async fn unlike_post(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiFailure> {
    let viewer = authenticate(&db, &headers).await?;
    let mut state = db.write().await;
    let post = state
        .posts
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Post not found"))?;
    post.liked_by.remove(&viewer.id);
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<UserBody>, ApiFailure> {
    authenticate(&db, &headers).await?;
    let state = db.read().await;
    state
        .users
        .get(&id)
        .map(|u| Json(user_body(u)))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "User not found"))
}

async fn list_user_posts(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<PostBody>>, ApiFailure> {
    let viewer = authenticate(&db, &headers).await?;
    let state = db.read().await;
    if !state.users.contains_key(&id) {
        return Err(failure(StatusCode::NOT_FOUND, "User not found"));
    }
    let posts = state
        .posts
        .iter()
        .rev()
        .filter(|p| p.author.id == id)
        .map(|p| post_body(p, &viewer.id))
        .collect();
    Ok(Json(posts))
}
