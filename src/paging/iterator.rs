//! Incremental, cancellable page fetcher.
//!
//! A [`PagedListIterator`] wraps an `index -> Response<PagedList<T>>` function
//! and grows an accumulated list one page per [`fetch_next`] call. The
//! [`IteratorState`] gate guarantees at most one fetch in flight; completions
//! that lose a race with [`reset`] or drop are discarded without touching state.
//!
//! [`fetch_next`]: PagedListIterator::fetch_next
//! [`reset`]: PagedListIterator::reset

use super::PagedList;
use crate::response::Response;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Page fetch function: receives the 0-based page index.
pub type FetchFn<T> = Arc<dyn Fn(usize) -> BoxFuture<'static, Response<PagedList<T>>> + Send + Sync>;

/// Lifecycle of an iterator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// Ready to fetch; nothing in flight.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Finished: last page, empty page, or error.
    Consumed,
}

/// Snapshot published on every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IteratorStatus {
    pub state: IteratorState,
    pub error: Option<String>,
    pub item_count: usize,
}

struct Inner<T> {
    items: Vec<T>,
    index: usize,
    state: IteratorState,
    error: Option<String>,
    /// Bumped on every cancellation; completions from older generations are dropped.
    generation: u64,
    job: Option<JoinHandle<()>>,
    fetch_fn: FetchFn<T>,
}

impl<T> Inner<T> {
    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(job) = self.job.take() {
            job.abort();
        }
    }

    fn status(&self) -> IteratorStatus {
        IteratorStatus {
            state: self.state,
            error: self.error.clone(),
            item_count: self.items.len(),
        }
    }
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    status: watch::Sender<IteratorStatus>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner<T>) {
        self.status.send_replace(inner.status());
    }

    fn complete(&self, generation: u64, result: Response<PagedList<T>>) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(generation, "discarding cancelled page fetch");
            return;
        }

        inner.job = None;
        match result {
            Response::Success(page) => {
                let terminal = page.is_terminal();
                inner.items.extend(page.list);
                inner.state = if terminal {
                    IteratorState::Consumed
                } else {
                    IteratorState::Idle
                };
            }
            Response::Error { message, .. } => {
                inner.error = Some(message);
                inner.state = IteratorState::Consumed;
            }
        }
        inner.index += 1;

        tracing::debug!(
            index = inner.index,
            state = ?inner.state,
            items = inner.items.len(),
            "page fetch completed"
        );
        self.publish(&inner);
    }
}

/// Accumulating iterator over a paged source.
pub struct PagedListIterator<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> PagedListIterator<T> {
    /// Creates an idle iterator at page 0.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<PagedList<T>>> + Send + 'static,
    {
        let inner = Inner {
            items: Vec::new(),
            index: 0,
            state: IteratorState::Idle,
            error: None,
            generation: 0,
            job: None,
            fetch_fn: boxed_fetch(fetch),
        };
        let (status, _) = watch::channel(inner.status());

        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                status,
            }),
        }
    }

    /// Starts fetching the next page. No-op unless the iterator is idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_next(&self) {
        let mut inner = self.shared.lock();
        if inner.state != IteratorState::Idle {
            return;
        }

        inner.state = IteratorState::Loading;
        let generation = inner.generation;
        let future = (inner.fetch_fn)(inner.index);
        tracing::debug!(index = inner.index, "fetching page");
        self.shared.publish(&inner);

        let shared = Arc::clone(&self.shared);
        inner.job = Some(tokio::spawn(async move {
            let result = future.await;
            shared.complete(generation, result);
        }));
    }

    /// Fetches the next page and waits until it settles.
    ///
    /// Returns immediately when the iterator isn't idle and nothing is loading.
    pub async fn load_next(&self) -> IteratorStatus {
        let mut rx = self.shared.status.subscribe();
        self.fetch_next();
        match rx.wait_for(|status| status.state != IteratorState::Loading).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        }
    }

    /// Cancels in-flight work and rewinds to an empty page 0.
    pub fn reset(&self) {
        let mut inner = self.shared.lock();
        inner.cancel();
        inner.items.clear();
        inner.index = 0;
        inner.state = IteratorState::Idle;
        inner.error = None;
        self.shared.publish(&inner);
    }

    /// Retries the page that failed. No-op when no error is stored.
    pub fn reload_failed_last_load(&self) {
        {
            let mut inner = self.shared.lock();
            if inner.error.is_none() {
                return;
            }
            inner.cancel();
            inner.index = inner.index.saturating_sub(1);
            inner.state = IteratorState::Idle;
            inner.error = None;
            self.shared.publish(&inner);
        }
        self.fetch_next();
    }

    /// Swaps the fetch function, keeping accumulated items and position.
    pub fn set_function<F, Fut>(&self, fetch: F)
    where
        F: Fn(usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<PagedList<T>>> + Send + 'static,
    {
        self.shared.lock().fetch_fn = boxed_fetch(fetch);
    }
}

impl<T> PagedListIterator<T> {
    pub fn state(&self) -> IteratorState {
        self.shared.lock().state
    }

    pub fn error(&self) -> Option<String> {
        self.shared.lock().error.clone()
    }

    /// Index of the next page to request.
    pub fn index(&self) -> usize {
        self.shared.lock().index
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> IteratorStatus {
        self.shared.lock().status()
    }

    /// Observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<IteratorStatus> {
        self.shared.status.subscribe()
    }

    /// Runs `f` over the accumulated items without cloning them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.lock().items)
    }
}

impl<T: Clone> PagedListIterator<T> {
    pub fn items(&self) -> Vec<T> {
        self.shared.lock().items.clone()
    }
}

impl<T> Drop for PagedListIterator<T> {
    fn drop(&mut self) {
        self.shared.lock().cancel();
    }
}

fn boxed_fetch<T, F, Fut>(fetch: F) -> FetchFn<T>
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<PagedList<T>>> + Send + 'static,
{
    Arc::new(move |index| fetch(index).boxed())
}
