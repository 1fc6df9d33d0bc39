//! Domain DTOs for the ThreadSpace API.
//!
//! # Design
//! These types mirror the backend's wire schema but are defined independently
//! of the mock-server crate; integration tests catch schema drift between the
//! two. Wire quirks are absorbed here once — `_id` field names, the camelCase
//! `isLiked` flag, optional author fields — so nothing downstream branches on
//! encoding details.
//!
//! Identifiers are opaque strings, not UUIDs: the backend issues Mongo-style
//! ids and nothing in the client ever needs to look inside one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user profile snapshot as returned by `/auth/me` and `/users/{id}`.
///
/// Immutable on the client side: identity refreshes replace the whole value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// The author snapshot embedded in every post.
///
/// `name` is required; the backend may omit the rest. The id is optional
/// because older posts carry only display fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A post snapshot as returned by `/posts/` and `/users/{id}/posts/`.
///
/// `is_liked` reflects the requesting user and defaults to `false` when the
/// backend omits it. The only local mutation derived from a post is the
/// provisional like toggle, which lives in [`crate::like::LikeToggle`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub comments: u32,
    #[serde(rename = "isLiked", default)]
    pub is_liked: bool,
    pub author: PostAuthor,
}

/// Request payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Request payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request payload for `POST /posts/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePost {
    pub content: String,
}

/// Normalized result of a successful login or registration.
///
/// The backend answers with either `{token}` or `{access_token}` (and
/// sometimes an embedded user snapshot). Normalization happens immediately
/// after parsing, in `ThreadspaceClient::parse_auth`, so the rest of the
/// client only ever sees this shape. The embedded user, when present, is
/// dropped: identity always comes from `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
}
