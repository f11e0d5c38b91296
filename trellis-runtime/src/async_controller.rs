//! Lazy future caching for async-data-driven widgets.
//!
//! An [`AsyncController`] wraps a nullary async factory. The first
//! `get_future` call invokes the factory and memoizes a shareable handle to
//! the in-flight (or completed) operation; later calls return the same
//! handle until `invalidate` clears the memo. A generation counter lets
//! consumers discard results from a superseded fetch.

use std::fmt;
use std::sync::Mutex;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;

use crate::Listeners;

/// The outcome of one async fetch. Errors are strings: by the time a result
/// reaches a widget it is presentation data, not a typed failure.
pub type FetchResult = Result<Value, String>;

/// A cloneable handle to a memoized in-flight or completed fetch.
pub type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

type FetchFactory = Box<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>;

/// A memoized fetch plus the generation that produced it.
#[derive(Clone)]
pub struct FetchHandle {
    pub generation: u64,
    pub future: SharedFetch,
}

struct Inner {
    factory: FetchFactory,
    memo: Option<SharedFetch>,
    last_generation: u64,
}

/// Lazy, invalidatable future cache with change listeners.
pub struct AsyncController {
    inner: Mutex<Inner>,
    pub listeners: Listeners,
}

impl AsyncController {
    /// Create a controller from an async factory.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        Self {
            inner: Mutex::new(Inner {
                factory: Box::new(move || factory().boxed()),
                memo: None,
                last_generation: 0,
            }),
            listeners: Listeners::new(),
        }
    }

    /// A controller whose fetch resolves to null until a host swaps in a
    /// real factory. Used for declared-but-unbound async variables.
    pub fn unbound() -> Self {
        Self::new(|| async { Ok(Value::Null) })
    }

    /// The memoized fetch, creating it on first call after construction or
    /// invalidation. The factory is invoked at most once per generation.
    pub fn get_future(&self) -> FetchHandle {
        let mut inner = self.inner.lock().expect("async controller poisoned");
        if inner.memo.is_none() {
            inner.last_generation += 1;
            let future = (inner.factory)().shared();
            inner.memo = Some(future);
        }
        FetchHandle {
            generation: inner.last_generation,
            future: inner.memo.clone().expect("memo just populated"),
        }
    }

    /// Whether a handle's generation still matches the live memo. Consumers
    /// discard completions that fail this check so a slow stale fetch never
    /// overwrites a newer result.
    pub fn is_current(&self, generation: u64) -> bool {
        let inner = self.inner.lock().expect("async controller poisoned");
        inner.memo.is_some() && inner.last_generation == generation
    }

    /// Clear the memo; the next `get_future` re-invokes the factory.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock().expect("async controller poisoned");
        inner.memo = None;
    }

    /// Clear the memo and synchronously notify listeners, each isolated so
    /// one failing listener cannot block the rest.
    pub fn invalidate_and_notify(&self) {
        self.invalidate();
        self.listeners.notify_isolated();
    }

    /// Swap the factory. The memo is marked dirty so the next fetch uses
    /// the new factory; a shared future already handed to awaiters keeps
    /// resolving with the old one.
    pub fn set_future_creator<F, Fut>(&self, factory: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let mut inner = self.inner.lock().expect("async controller poisoned");
        inner.factory = Box::new(move || factory().boxed());
        inner.memo = None;
    }
}

impl fmt::Debug for AsyncController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().expect("async controller poisoned");
        f.debug_struct("AsyncController")
            .field("cached", &inner.memo.is_some())
            .field("generation", &inner.last_generation)
            .field("listeners", &self.listeners)
            .finish()
    }
}
