//! Stateless HTTP request builder and response parser for the ThreadSpace API.
//!
//! # Design
//! `ThreadspaceClient` holds a `base_url` and the process-wide bearer slot,
//! and nothing else. Each API operation is split into a `build_*` method that
//! produces an [`HttpRequest`] and a `parse_*` method that consumes an
//! [`HttpResponse`]. A [`Transport`](crate::transport::Transport) executes
//! the actual HTTP round-trip in between, keeping this layer deterministic
//! and free of I/O dependencies.
//!
//! The bearer slot is the one piece of shared mutable state in the whole
//! client (persistence lives in [`crate::store::TokenStore`]): once a token
//! is attached, every built request carries `Authorization: Bearer <token>`,
//! auth endpoints included — the slot is overwritten whole by attach/detach,
//! never merged. Clones share the slot.
//!
//! Response interpretation also normalizes the backend's loose auth shapes:
//! `{token}` is the canonical success payload, `{access_token}` is accepted
//! as an alias, and 4xx bodies have their FastAPI-style `detail` (or
//! `message`) extracted into [`ApiError::Auth`].

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthGrant, CreatePost, Credentials, NewAccount, Post, User};

/// Request builder / response parser for the ThreadSpace API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network. Cloning is cheap and shares the bearer slot, so a
/// token attached through any clone is visible to all of them.
#[derive(Debug, Clone)]
pub struct ThreadspaceClient {
    base_url: String,
    bearer: Arc<RwLock<Option<String>>>,
}

impl ThreadspaceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer: Arc::new(RwLock::new(None)),
        }
    }

    // -----------------------------------------------------------------------
    // Bearer slot
    // -----------------------------------------------------------------------

    /// Attach `token` so every subsequently built request carries
    /// `Authorization: Bearer <token>`. Overwrites any previous token.
    pub fn attach_token(&self, token: &str) {
        *self.bearer.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    /// Remove the attached token; subsequently built requests carry no
    /// authorization header.
    pub fn detach_token(&self) {
        *self.bearer.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The currently attached token, if any.
    pub fn token(&self) -> Option<String> {
        self.bearer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Headers for a request: `content-type` when there is a body, plus the
    /// bearer header when a token is attached.
    fn headers(&self, has_body: bool) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if has_body {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    fn get(&self, path: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: self.headers(false),
            body: None,
        }
    }

    fn post_json<T: serde::Serialize>(&self, path: String, payload: &T) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path,
            headers: self.headers(true),
            body: Some(body),
        })
    }

    // -----------------------------------------------------------------------
    // Build requests
    // -----------------------------------------------------------------------

    pub fn build_me(&self) -> HttpRequest {
        self.get(format!("{}/auth/me", self.base_url))
    }

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.post_json(format!("{}/auth/login", self.base_url), credentials)
    }

    pub fn build_register(&self, account: &NewAccount) -> Result<HttpRequest, ApiError> {
        self.post_json(format!("{}/auth/register", self.base_url), account)
    }

    pub fn build_feed(&self) -> HttpRequest {
        self.get(format!("{}/posts/", self.base_url))
    }

    pub fn build_create_post(&self, draft: &CreatePost) -> Result<HttpRequest, ApiError> {
        self.post_json(format!("{}/posts/", self.base_url), draft)
    }

    pub fn build_like(&self, post_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/posts/{post_id}/like/", self.base_url),
            headers: self.headers(false),
            body: None,
        }
    }

    pub fn build_unlike(&self, post_id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/posts/{post_id}/like/", self.base_url),
            headers: self.headers(false),
            body: None,
        }
    }

    pub fn build_user(&self, user_id: &str) -> HttpRequest {
        self.get(format!("{}/users/{user_id}", self.base_url))
    }

    pub fn build_user_posts(&self, user_id: &str) -> HttpRequest {
        self.get(format!("{}/users/{user_id}/posts/", self.base_url))
    }

    // -----------------------------------------------------------------------
    // Parse responses
    // -----------------------------------------------------------------------

    /// `/auth/me` — any 4xx means the token was rejected.
    pub fn parse_me(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_auth_status(&response, 200)?;
        parse_body(&response)
    }

    /// `/auth/login` and `/auth/register` — normalizes `{token}` and
    /// `{access_token}` into [`AuthGrant`]; `token` wins when both are
    /// present; an embedded `user` object is ignored.
    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthGrant, ApiError> {
        // Login answers 200, register 201; accept either on both.
        if response.status != 200 && response.status != 201 {
            return Err(auth_error(&response));
        }

        #[derive(serde::Deserialize)]
        struct AuthResponse {
            #[serde(default)]
            token: Option<String>,
            #[serde(default)]
            access_token: Option<String>,
        }

        let parsed: AuthResponse = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        let token = parsed.token.or(parsed.access_token).ok_or_else(|| {
            ApiError::Deserialization("auth response carries neither `token` nor `access_token`".to_string())
        })?;
        Ok(AuthGrant { token })
    }

    pub fn parse_feed(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_created_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response, 201)?;
        parse_body(&response)
    }

    pub fn parse_like(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_unlike(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }

    pub fn parse_user_posts(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        check_status(&response, 200)?;
        parse_body(&response)
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-success status codes on resource endpoints to the appropriate
/// `ApiError` variant: a rejected bearer is an auth failure wherever it
/// surfaces, 404 means the resource does not exist, anything else keeps its
/// raw status and body.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    match response.status {
        401 => Err(auth_error(response)),
        404 => Err(ApiError::NotFound),
        _ => Err(ApiError::Http {
            status: response.status,
            body: response.body.clone(),
        }),
    }
}

/// Status mapping for auth endpoints, where every 4xx is an auth failure
/// (wrong credentials, duplicate email, expired token).
fn check_auth_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if (400..500).contains(&response.status) {
        return Err(auth_error(response));
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Build an `ApiError::Auth` carrying the server's `detail` or `message`
/// field when the body provides one (FastAPI answers `{"detail": ...}`),
/// falling back to a generic message.
fn auth_error(response: &HttpResponse) -> ApiError {
    let message = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| "authentication failed".to_string());
    ApiError::Auth { message }
}
