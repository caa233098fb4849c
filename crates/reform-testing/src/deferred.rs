//! Manually resolved async results.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// A queue of pending results, resolved from the test body.
///
/// Every [`Deferred::wait`] call registers a slot immediately; its future
/// completes once the slot is resolved. A slot that is dropped unresolved
/// never completes.
///
/// # Example
///
/// ```rust,ignore
/// let deferred = Deferred::new();
/// let rule = Rule::from_async({
///     let deferred = deferred.clone();
///     move |_: &Option<String>| deferred.wait()
/// });
///
/// // ... start two passes ...
/// deferred.resolve_newest("Too short");
/// deferred.resolve_oldest("");
/// ```
pub struct Deferred<T> {
    slots: Arc<Mutex<VecDeque<oneshot::Sender<T>>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T: Send + 'static> Deferred<T> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Register a slot and wait for it to be resolved.
    pub fn wait(&self) -> impl Future<Output = T> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(tx);
        async move {
            match rx.await {
                Ok(value) => value,
                Err(_) => std::future::pending().await,
            }
        }
    }

    /// Resolve the slot registered first. Returns `false` if none is pending.
    pub fn resolve_oldest(&self, value: T) -> bool {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        slot.map(|tx| tx.send(value).is_ok()).unwrap_or(false)
    }

    /// Resolve the slot registered last. Returns `false` if none is pending.
    pub fn resolve_newest(&self, value: T) -> bool {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_back();
        slot.map(|tx| tx.send(value).is_ok()).unwrap_or(false)
    }

    /// Number of unresolved slots.
    pub fn pending(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<T: Send + 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}
