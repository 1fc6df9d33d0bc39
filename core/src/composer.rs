//! Post composer: draft text, trim-validated submission, refresh-on-success.
//!
//! The composer owns the draft so that success and failure can treat it
//! differently: a created post clears it, a failed request leaves it intact
//! for the user to retry. Empty and whitespace-only drafts are rejected
//! before any request is built. After a successful creation the composer
//! invokes the refresh hook it was constructed with, typically a feed cell's
//! [`refetch`](crate::fetch::FetchCell::refetch), so the new post shows up
//! without a manual reload.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::warn;

use crate::error::ApiError;
use crate::transport::Api;
use crate::types::{CreatePost, Post};

type Refresh = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub struct Composer {
    api: Api,
    draft: watch::Sender<String>,
    on_created: Refresh,
}

impl Composer {
    /// `on_created` runs after every successful submission.
    pub fn new<F, Fut>(api: Api, on_created: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (draft, _) = watch::channel(String::new());
        Self {
            api,
            draft,
            on_created: Arc::new(move || on_created().boxed()),
        }
    }

    pub fn set_draft(&self, text: &str) {
        self.draft.send_replace(text.to_string());
    }

    pub fn draft(&self) -> String {
        self.draft.borrow().clone()
    }

    /// Watch the draft change and clear.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.draft.subscribe()
    }

    /// Submit the current draft.
    ///
    /// A draft that trims to nothing is rejected with
    /// [`ApiError::Validation`] before any request is made, leaving the
    /// draft as it was. Otherwise the trimmed text is posted; on success the
    /// draft is cleared and the refresh hook runs, on failure the draft
    /// stays put so the user can retry.
    pub async fn submit(&self) -> Result<Post, ApiError> {
        let content = self.draft().trim().to_string();
        if content.is_empty() {
            return Err(ApiError::Validation(
                "post content must not be empty".to_string(),
            ));
        }

        match self.api.create_post(&CreatePost { content }).await {
            Ok(post) => {
                self.draft.send_replace(String::new());
                (self.on_created)().await;
                Ok(post)
            }
            Err(e) => {
                warn!(error = %e, "post creation failed, keeping draft");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::client::ThreadspaceClient;
    use crate::transport::testing::ScriptedTransport;

    const CREATED_BODY: &str = r#"{
        "_id": "p9", "content": "hello", "created_at": "2024-08-02T14:30:00Z",
        "likes": 0, "comments": 0, "isLiked": false, "author": {"name": "Ada"}
    }"#;

    fn composer_with(transport: Arc<ScriptedTransport>) -> (Composer, Arc<AtomicU32>) {
        let refreshes = Arc::new(AtomicU32::new(0));
        let api = Api::new(ThreadspaceClient::new("http://localhost:8000"), transport);
        let composer = Composer::new(api, {
            let refreshes = refreshes.clone();
            move || {
                let refreshes = refreshes.clone();
                async move {
                    refreshes.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
        (composer, refreshes)
    }

    #[tokio::test]
    async fn empty_draft_is_rejected_without_a_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let (composer, refreshes) = composer_with(transport.clone());
        composer.set_draft("");

        let err = composer.submit().await.unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        assert!(transport.requests().is_empty());
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whitespace_only_draft_is_rejected_unchanged() {
        let transport = Arc::new(ScriptedTransport::new());
        let (composer, _) = composer_with(transport.clone());
        composer.set_draft("   ");

        assert!(composer.submit().await.is_err());

        assert!(transport.requests().is_empty());
        assert_eq!(composer.draft(), "   ", "rejection leaves the draft alone");
    }

    #[tokio::test]
    async fn successful_submit_sends_trimmed_content_and_clears() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(201, CREATED_BODY);
        let (composer, refreshes) = composer_with(transport.clone());
        composer.set_draft("  hello  ");

        let post = composer.submit().await.unwrap();

        assert_eq!(post.content, "hello");
        assert_eq!(composer.draft(), "");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        let seen = transport.requests();
        assert_eq!(seen[0].path, "http://localhost:8000/posts/");
        let body: serde_json::Value =
            serde_json::from_str(seen[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["content"], "hello");
    }

    #[tokio::test]
    async fn failed_submit_keeps_the_draft_for_retry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_ok(500, "internal error");
        let (composer, refreshes) = composer_with(transport.clone());
        composer.set_draft("hello");

        let err = composer.submit().await.unwrap_err();

        assert!(matches!(err, ApiError::Http { status: 500, .. }));
        assert_eq!(composer.draft(), "hello");
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }
}
