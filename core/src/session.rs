//! Authentication lifecycle: one owned state machine, observed over a
//! watch channel.
//!
//! # Design
//! [`Session`] can only name an identity in its `Authenticated` variant, so
//! "user present implies authenticated" holds by construction rather than by
//! discipline. [`SessionManager`] is the single writer: every transition goes
//! through `send_replace` on one watch sender, and hosts observe through
//! [`SessionManager::subscribe`]. Share the manager itself behind an `Arc`.
//!
//! The identity is never taken from a login or register payload. Those calls
//! only yield a token; the user attached to it always comes from
//! `GET /auth/me`, so there is exactly one source of truth for who is
//! signed in.

use tokio::sync::watch;
use tracing::debug;

use crate::error::ApiError;
use crate::store::TokenStore;
use crate::transport::Api;
use crate::types::{Credentials, NewAccount, User};

/// Authentication state. The identity lives inside `Authenticated` and
/// nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// No valid token; login or register are the only ways forward.
    Unauthenticated,
    /// A token is being exchanged or validated; the outcome is not known yet.
    Authenticating,
    /// A token resolved to this user.
    Authenticated(User),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    /// The signed-in user, when there is one.
    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Owns the session state machine and the token it rides on.
///
/// All transitions funnel through this one object: bootstrap at startup,
/// login/register, logout. On success the bearer token is attached to the
/// API client and persisted through the [`TokenStore`]; on any failure both
/// are cleared together, so memory, disk and state never disagree.
pub struct SessionManager {
    api: Api,
    store: TokenStore,
    state: watch::Sender<Session>,
}

impl SessionManager {
    pub fn new(api: Api, store: TokenStore) -> Self {
        let (state, _) = watch::channel(Session::Unauthenticated);
        Self { api, store, state }
    }

    /// Watch the session state. The receiver starts at the current value and
    /// sees every later transition that it polls in time for.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// The API surface this manager authenticates.
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Startup path: adopt a previously persisted token, if any.
    ///
    /// With no stored token the session settles at `Unauthenticated` without
    /// touching the network. A stored token is attached and validated against
    /// `/auth/me`; when that fails for any reason the token is discarded from
    /// memory and disk, since a token we cannot resolve is dead weight.
    pub async fn bootstrap(&self) {
        let Some(token) = self.store.load() else {
            self.state.send_replace(Session::Unauthenticated);
            return;
        };
        self.api.client().attach_token(&token);
        self.state.send_replace(Session::Authenticating);
        if let Err(e) = self.resolve_identity().await {
            debug!(error = %e, "stored token failed to resolve, discarding it");
            self.discard_session();
        }
    }

    /// Exchange credentials for a token, persist it, and resolve the
    /// identity behind it.
    ///
    /// On any failure the session ends `Unauthenticated` with no token in
    /// memory or on disk, exactly as if the attempt never happened.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        self.state.send_replace(Session::Authenticating);
        match self.api.login(credentials).await {
            Ok(grant) => self.adopt_token(&grant.token).await,
            Err(e) => {
                self.state.send_replace(Session::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Create an account and sign straight in. Same outcome contract as
    /// [`login`](Self::login).
    pub async fn register(&self, account: &NewAccount) -> Result<User, ApiError> {
        self.state.send_replace(Session::Authenticating);
        match self.api.register(account).await {
            Ok(grant) => self.adopt_token(&grant.token).await,
            Err(e) => {
                self.state.send_replace(Session::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Fetch the identity behind the currently attached token and, on
    /// success, move the session to `Authenticated`.
    ///
    /// Any failure publishes `Unauthenticated` — an identity we cannot
    /// confirm is not one we keep showing. The token itself is left
    /// untouched; the caller decides whether it is worth keeping.
    pub async fn resolve_identity(&self) -> Result<User, ApiError> {
        match self.api.me().await {
            Ok(user) => {
                self.state
                    .send_replace(Session::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.state.send_replace(Session::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Drop the session locally: detach the token, clear the store, settle
    /// at `Unauthenticated`. Purely client-side, no request is made, and it
    /// cannot fail.
    pub fn logout(&self) {
        self.discard_session();
    }

    async fn adopt_token(&self, token: &str) -> Result<User, ApiError> {
        self.api.client().attach_token(token);
        self.store.save(token);
        match self.resolve_identity().await {
            Ok(user) => Ok(user),
            Err(e) => {
                // a fresh token that cannot resolve an identity is useless
                debug!(error = %e, "new token failed to resolve, discarding it");
                self.discard_session();
                Err(e)
            }
        }
    }

    fn discard_session(&self) {
        self.api.client().detach_token();
        self.store.clear();
        self.state.send_replace(Session::Unauthenticated);
    }
}
