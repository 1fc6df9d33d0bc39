//! Optimistic like/unlike: flip locally first, confirm remotely, revert on
//! failure.
//!
//! # Design
//! [`LikeToggle`] owns the liked flag and displayed count for one post. A
//! toggle flips both immediately so the UI never waits on the network, then
//! issues the matching remote call; on failure the pre-toggle snapshot is
//! restored wholesale. Failures stay inside the toggle (logged, reverted),
//! the caller only ever sees a consistent state.
//!
//! Toggles are single-flight: while one is outstanding, further toggles are
//! rejected and simply report the current state. Without the guard, two
//! overlapping flips could interleave their revert paths and leave the count
//! off by one until the next refetch.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::transport::Api;
use crate::types::Post;

/// Displayed like state of one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u32,
}

impl LikeState {
    /// The state after one toggle: flag inverted, count adjusted by one.
    /// The count saturates at both ends rather than wrapping.
    fn flipped(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                likes: self.likes.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                likes: self.likes.saturating_add(1),
            }
        }
    }
}

/// Like/unlike controller for a single post.
pub struct LikeToggle {
    api: Api,
    post_id: String,
    state: watch::Sender<LikeState>,
    in_flight: AtomicBool,
}

impl LikeToggle {
    pub fn new(api: Api, post_id: impl Into<String>, initial: LikeState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            api,
            post_id: post_id.into(),
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Controller seeded from a feed snapshot.
    pub fn for_post(api: Api, post: &Post) -> Self {
        Self::new(
            api,
            post.id.clone(),
            LikeState {
                liked: post.is_liked,
                likes: post.likes,
            },
        )
    }

    /// Flip the like state, optimistically. Returns the state the caller
    /// should display once the toggle has settled.
    ///
    /// While a toggle is outstanding, further calls are rejected and return
    /// the current state unchanged. A failed remote call restores the
    /// pre-toggle snapshot exactly; the error is logged, not surfaced.
    pub async fn toggle(&self) -> LikeState {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!(post_id = %self.post_id, "toggle already in flight, ignoring");
            return self.state();
        }

        let before = self.state();
        let optimistic = before.flipped();
        self.state.send_replace(optimistic);

        let result = if optimistic.liked {
            self.api.like(&self.post_id).await
        } else {
            self.api.unlike(&self.post_id).await
        };
        if let Err(e) = result {
            warn!(post_id = %self.post_id, error = %e, "like toggle failed, reverting");
            self.state.send_replace(before);
        }

        self.in_flight.store(false, Ordering::SeqCst);
        self.state()
    }

    /// Snapshot of the displayed state.
    pub fn state(&self) -> LikeState {
        *self.state.borrow()
    }

    /// Watch the displayed state flip and settle.
    pub fn subscribe(&self) -> watch::Receiver<LikeState> {
        self.state.subscribe()
    }
}
