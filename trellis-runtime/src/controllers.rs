//! Controller adapters.
//!
//! Variable declarations with a controller type resolve to one of these
//! handles instead of a JSON value. Each is a cheap-to-clone shared handle
//! whose state outlives individual render passes but not the owning
//! subtree.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;

use crate::AsyncController;

/// Identifier handed back by [`Listeners::add`], used to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A list of change listeners shared by controller types.
///
/// Notification snapshots the list before invoking, so a listener may
/// add/remove listeners without deadlocking.
#[derive(Default)]
pub struct Listeners {
    entries: Mutex<Vec<(ListenerId, Arc<dyn Fn() + Send + Sync>)>>,
    next_id: AtomicU64,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .expect("listener list poisoned")
            .push((id, Arc::new(listener)));
        id
    }

    pub fn remove(&self, id: ListenerId) {
        self.entries
            .lock()
            .expect("listener list poisoned")
            .retain(|(entry_id, _)| *entry_id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("listener list poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener synchronously. Panics propagate.
    pub fn notify(&self) {
        for (_, listener) in self.snapshot() {
            listener();
        }
    }

    /// Invoke every listener, isolating failures: a panicking listener is
    /// logged and the rest still run.
    pub fn notify_isolated(&self) {
        for (id, listener) in self.snapshot() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener()));
            if result.is_err() {
                tracing::warn!(listener = id.0, "listener panicked during notification");
            }
        }
    }

    fn snapshot(&self) -> Vec<(ListenerId, Arc<dyn Fn() + Send + Sync>)> {
        self.entries.lock().expect("listener list poisoned").clone()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}

/// A controller adapter resolved from a typed variable declaration.
#[derive(Debug, Clone)]
pub enum Controller {
    Scroll(Arc<ScrollController>),
    TextEditing(Arc<TextEditingController>),
    Timer(Arc<TimerController>),
    Page(Arc<PageController>),
    Async(Arc<AsyncController>),
    Stream(Arc<StreamController>),
    CancelToken(ApiCancelToken),
    Story(Arc<StoryController>),
}

impl Controller {
    pub fn as_async(&self) -> Option<&Arc<AsyncController>> {
        match self {
            Controller::Async(controller) => Some(controller),
            _ => None,
        }
    }
}

/// Scroll position holder for scrollable widgets.
#[derive(Debug, Default)]
pub struct ScrollController {
    offset: Mutex<f64>,
    pub listeners: Listeners,
}

impl ScrollController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> f64 {
        *self.offset.lock().expect("scroll offset poisoned")
    }

    pub fn jump_to(&self, offset: f64) {
        *self.offset.lock().expect("scroll offset poisoned") = offset;
        self.listeners.notify();
    }
}

/// Editable text holder for input widgets.
#[derive(Debug, Default)]
pub struct TextEditingController {
    text: Mutex<String>,
    pub listeners: Listeners,
}

impl TextEditingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().expect("text poisoned").clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.lock().expect("text poisoned") = text.into();
        self.listeners.notify();
    }

    pub fn clear(&self) {
        self.set_text(String::new());
    }
}

/// Periodic tick source driven by the tokio runtime.
#[derive(Debug, Default)]
pub struct TimerController {
    ticks: Arc<AtomicU64>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    pub listeners: Listeners,
}

impl TimerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .expect("timer task poisoned")
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Start ticking at the given interval, replacing any running timer.
    /// The controller handle must be the `Arc` the tree holds so listener
    /// notification observes the same state.
    pub fn start(self: &Arc<Self>, interval: Duration) {
        self.stop();
        let controller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of tokio's interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                controller.ticks.fetch_add(1, Ordering::Relaxed);
                controller.listeners.notify();
            }
        });
        *self.task.lock().expect("timer task poisoned") = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().expect("timer task poisoned").take() {
            task.abort();
        }
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Current-page holder for paged widgets (carousel, story).
#[derive(Debug, Default)]
pub struct PageController {
    current: AtomicUsize,
    pub listeners: Listeners,
}

impl PageController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn jump_to_page(&self, page: usize) {
        self.current.store(page, Ordering::Relaxed);
        self.listeners.notify();
    }
}

/// A broadcast channel of JSON values for stream-driven widgets.
#[derive(Debug)]
pub struct StreamController {
    sender: broadcast::Sender<Value>,
}

impl StreamController {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Emit a value; a send with no live subscribers is not an error.
    pub fn emit(&self, value: Value) {
        let _ = self.sender.send(value);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.sender.subscribe()
    }
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative cancellation token for in-flight API calls.
///
/// Cancellation is observed by the transport; it does not stop a processor
/// that has already resolved.
#[derive(Debug, Clone, Default)]
pub struct ApiCancelToken {
    cancelled: Arc<AtomicBool>,
}

impl ApiCancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Playback position for story-style widgets.
#[derive(Debug, Default)]
pub struct StoryController {
    index: AtomicUsize,
    playing: AtomicBool,
    pub listeners: Listeners,
}

impl StoryController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn play(&self) {
        self.playing.store(true, Ordering::Relaxed);
        self.listeners.notify();
    }

    pub fn pause(&self) {
        self.playing.store(false, Ordering::Relaxed);
        self.listeners.notify();
    }

    pub fn jump_to(&self, index: usize) {
        self.index.store(index, Ordering::Relaxed);
        self.listeners.notify();
    }
}
