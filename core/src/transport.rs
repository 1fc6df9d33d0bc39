//! The async I/O seam and the typed API surface built on top of it.
//!
//! [`ThreadspaceClient`] stays free of I/O; [`Transport`] is the one trait a
//! host implements to plug in its HTTP machinery (the integration tests use a
//! blocking `ureq` agent behind `spawn_blocking`, a browser host would wrap
//! `fetch`). [`Api`] composes the two: build the request, execute it, parse
//! the response.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::ThreadspaceClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{AuthGrant, CreatePost, Credentials, NewAccount, Post, User};

/// Executes one HTTP round-trip.
///
/// Implementations report transport-level failures (DNS, refused connection,
/// timeout) as [`ApiError::Network`] and hand every received response back
/// as-is; status interpretation belongs to the parse layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Typed async access to every ThreadSpace endpoint.
///
/// Thin composition of [`ThreadspaceClient`] and a [`Transport`]; holds no
/// state of its own beyond the shared bearer slot inside the client, so
/// cloning is cheap and clones stay interchangeable.
#[derive(Clone)]
pub struct Api {
    client: ThreadspaceClient,
    transport: Arc<dyn Transport>,
}

impl Api {
    pub fn new(client: ThreadspaceClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    /// The underlying builder/parser, for hosts that manage the bearer slot
    /// directly.
    pub fn client(&self) -> &ThreadspaceClient {
        &self.client
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let response = self.transport.execute(self.client.build_me()).await?;
        self.client.parse_me(response)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let request = self.client.build_login(credentials)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_auth(response)
    }

    pub async fn register(&self, account: &NewAccount) -> Result<AuthGrant, ApiError> {
        let request = self.client.build_register(account)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_auth(response)
    }

    pub async fn feed(&self) -> Result<Vec<Post>, ApiError> {
        let response = self.transport.execute(self.client.build_feed()).await?;
        self.client.parse_feed(response)
    }

    pub async fn create_post(&self, draft: &CreatePost) -> Result<Post, ApiError> {
        let request = self.client.build_create_post(draft)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_created_post(response)
    }

    pub async fn like(&self, post_id: &str) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_like(post_id)).await?;
        self.client.parse_like(response)
    }

    pub async fn unlike(&self, post_id: &str) -> Result<(), ApiError> {
        let response = self
            .transport
            .execute(self.client.build_unlike(post_id))
            .await?;
        self.client.parse_unlike(response)
    }

    pub async fn user(&self, user_id: &str) -> Result<User, ApiError> {
        let response = self.transport.execute(self.client.build_user(user_id)).await?;
        self.client.parse_user(response)
    }

    pub async fn user_posts(&self, user_id: &str) -> Result<Vec<Post>, ApiError> {
        let response = self
            .transport
            .execute(self.client.build_user_posts(user_id))
            .await?;
        self.client.parse_user_posts(response)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for exercising session, fetch and like flows
    //! without a server.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays a queue of canned outcomes and records every request it saw.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn push_ok(&self, status: u16, body: &str) {
            self.script
                .lock()
                .unwrap()
                .push_back(Ok(HttpResponse::with_body(status, body)));
        }

        pub(crate) fn push_err(&self, error: ApiError) {
            self.script.lock().unwrap().push_back(Err(error));
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Network("transport script exhausted".to_string())))
        }
    }
}
