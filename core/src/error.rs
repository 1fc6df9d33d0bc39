//! Error types for the ThreadSpace API client.
//!
//! # Design
//! `NotFound` and `Auth` get dedicated variants because callers branch on
//! them: "the profile does not exist" renders differently from "the token
//! was rejected", and auth failures carry a server-supplied message worth
//! showing to the user. All other non-2xx responses land in `Http` with the
//! raw status code and body for debugging.
//!
//! The enum is `Clone` because fetch cells store the error of the latest
//! attempt and hand out snapshots of it.

use thiserror::Error;

/// Errors produced by the client: request building, transport execution and
/// response parsing.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The transport could not complete the round-trip at all (connection
    /// refused, DNS, timeout). Distinct from any server-sent status.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the caller's credentials or bearer token. For
    /// auth endpoints this carries the server-provided `detail`/`message`
    /// when the body has one, otherwise a generic fallback.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The server returned 404 — the requested user or post does not exist.
    #[error("resource not found")]
    NotFound,

    /// The input was rejected client-side before any request was built.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server returned a non-success status not covered above.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// True when the error means the current token is not (or no longer)
    /// valid. Session bootstrap treats these as "stale credential".
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }
}
