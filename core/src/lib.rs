//! Client-side core for ThreadSpace, a feed / profile / post social client.
//!
//! # Overview
//! Everything a host UI needs to talk to the ThreadSpace backend: the
//! session/authentication lifecycle, typed access to every endpoint, and the
//! small state machines screens are built from (fetch cells, the optimistic
//! like toggle, the post composer). Rendering and routing stay with the
//! host; this crate owns the state transitions.
//!
//! # Design
//! - `ThreadspaceClient` is the sans-IO layer: `build_*` produces
//!   `HttpRequest` values, `parse_*` consumes `HttpResponse` values, and the
//!   async [`Transport`] trait is the single seam where real I/O plugs in.
//! - `SessionManager` is the one writer of authentication state; everything
//!   else observes it through a watch channel. The identity always comes
//!   from `GET /auth/me`, never from login payloads.
//! - Backend response shapes are normalized at the parse boundary
//!   (`token` vs `access_token`), so the rest of the crate sees one
//!   canonical contract.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod composer;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod like;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use client::ThreadspaceClient;
pub use composer::Composer;
pub use config::Config;
pub use error::ApiError;
pub use fetch::{FetchCell, FetchState};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use like::{LikeState, LikeToggle};
pub use session::{Session, SessionManager};
pub use store::TokenStore;
pub use transport::{Api, Transport};
pub use types::{AuthGrant, CreatePost, Credentials, NewAccount, Post, PostAuthor, User};
