//! Generic async fetch cell: one remote read, observable as
//! `{data, loading, error}`.
//!
//! # Design
//! A [`FetchCell`] wraps a zero-argument async producer (usually a closure
//! over [`Api`](crate::transport::Api)) and tracks the state of its latest
//! attempt. Results are stale-while-revalidating: a re-run keeps the previous
//! `data` visible until the new attempt settles, and a failed attempt keeps
//! the previous `data` next to its error.
//!
//! Overlapping runs are legal and resolved by recency, not by settle order:
//! every run takes a fresh generation number and a completion is applied only
//! while its generation is still the latest. A slow response from an old run
//! can therefore never overwrite the result of a newer one; it is discarded
//! wholesale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::debug;

use crate::error::ApiError;

type Producer<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Snapshot of a cell's state.
///
/// At most one of `data`/`error` reflects the latest settled attempt;
/// `loading` means an attempt is in flight and whatever is visible came from
/// an earlier one.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub loading: bool,
}

impl<T> FetchState<T> {
    fn initial() -> Self {
        Self {
            data: None,
            error: None,
            loading: true,
        }
    }
}

/// Tracks one remote read for a screen: run once when the screen appears,
/// refetch on demand after mutations.
///
/// A freshly constructed cell reports `loading` until its first
/// [`run`](Self::run) settles; hosts start that run right after construction.
pub struct FetchCell<T> {
    producer: Producer<T>,
    state: watch::Sender<FetchState<T>>,
    generation: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> FetchCell<T> {
    pub fn new<P, Fut>(producer: P) -> Self
    where
        P: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (state, _) = watch::channel(FetchState::initial());
        Self {
            producer: Arc::new(move || producer().boxed()),
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Construct the cell and run the producer once, the way a screen does
    /// when it first appears. The returned cell has settled its first attempt.
    pub async fn mount<P, Fut>(producer: P) -> Self
    where
        P: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let cell = Self::new(producer);
        cell.run().await;
        cell
    }

    /// Invoke the producer once and settle the cell with its outcome.
    ///
    /// Marks the cell `loading` and clears any previous error for the
    /// duration of the attempt. If a newer run starts before this one
    /// settles, this one's outcome is discarded.
    pub async fn run(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = (self.producer)().await;

        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!(generation, "discarding stale fetch result");
                return false;
            }
            match result {
                Ok(data) => {
                    s.data = Some(data);
                    s.error = None;
                }
                Err(e) => {
                    // keep stale data visible next to the error
                    s.error = Some(e);
                }
            }
            s.loading = false;
            true
        });
    }

    /// Re-run the originally supplied producer; the usual follow-up to a
    /// mutation.
    pub async fn refetch(&self) {
        self.run().await;
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.state.borrow().clone()
    }

    /// Watch the cell settle and re-run over time.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.state.subscribe()
    }
}
