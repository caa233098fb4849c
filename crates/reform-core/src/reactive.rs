//! Minimal reactive substrate for fields.
//!
//! Fields publish a version counter through a [`Notifier`] on every state
//! change; observers re-read derived state when it ticks. Standing
//! validation reactions are gated on [`Observers`]: they exist only while
//! enough [`WatchGuard`]s are alive.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Weak;
use tokio::sync::{broadcast, watch};

/// Publishes a monotonically increasing change counter.
#[derive(Debug)]
pub struct Notifier {
    sender: watch::Sender<u64>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self { sender }
    }

    /// Bump the version and wake every subscriber.
    pub fn notify(&self) {
        self.sender.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Subscribe to version changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        *self.sender.borrow()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Events a streamed-validator field emits around its passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The first validation pass of the field completed.
    Init,
    /// The user changed the input.
    Changing,
    /// A validation pass completed and committed its results.
    Changed,
}

/// Broadcast of [`LifecycleEvent`]s.
///
/// Emitting with nobody listening is not an error.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl Lifecycle {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

/// Counts attached watchers against a low-water mark.
///
/// The watched resource is active while the count is above the mark.
#[derive(Debug)]
pub struct Observers {
    count: AtomicUsize,
    low_water_mark: usize,
}

impl Observers {
    pub fn new(low_water_mark: usize) -> Self {
        Self {
            count: AtomicUsize::new(0),
            low_water_mark,
        }
    }

    /// Number of attached watchers.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn low_water_mark(&self) -> usize {
        self.low_water_mark
    }

    /// Whether the count is above the low-water mark.
    pub fn is_active(&self) -> bool {
        self.count() > self.low_water_mark
    }

    /// Register a watcher. Returns `true` when this attach activated the
    /// resource.
    pub(crate) fn attach(&self) -> bool {
        self.count.fetch_add(1, Ordering::SeqCst) == self.low_water_mark
    }

    /// Unregister a watcher. Returns `true` when this detach brought the
    /// count back down to the low-water mark.
    pub(crate) fn detach(&self) -> bool {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        previous == self.low_water_mark + 1
    }
}

/// Something whose standing work is gated on being watched.
pub trait Watched: Send + Sync {
    fn observers(&self) -> &Observers;

    /// Called when the last watcher above the low-water mark went away.
    fn on_unwatched(&self);
}

/// Keeps a watched resource active. Dropping it detaches the watcher.
#[must_use = "the field is only watched while the guard is alive"]
pub struct WatchGuard {
    target: Weak<dyn Watched>,
}

impl WatchGuard {
    pub(crate) fn new(target: Weak<dyn Watched>) -> Self {
        Self { target }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(target) = self.target.upgrade() {
            if target.observers().detach() {
                target.on_unwatched();
            }
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("alive", &(self.target.strong_count() > 0))
            .finish()
    }
}
