//! Duplicate suppression keyed by client token

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Runs at most one successful call per key.
///
/// Callers racing on the same key wait for the in-flight call. A failed call
/// remembers nothing: a waiter already queued on the key runs its own
/// attempt, and with no one waiting the key is dropped.
pub struct IdempotencyGroup<T> {
    calls: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T> Default for IdempotencyGroup<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> IdempotencyGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the remembered result for `key`, or run `f` to produce it.
    pub async fn run<F, Fut, E>(&self, key: &str, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.calls.lock().entry(key.to_owned()).or_default().clone();
        let result = cell.get_or_try_init(f).await.cloned();
        if result.is_err() {
            self.drop_failed(key, &cell);
        }
        result
    }

    /// Remove `key` if it still maps to `cell`, nothing was stored in it and
    /// no other caller holds it.
    fn drop_failed(&self, key: &str, cell: &Arc<OnceCell<T>>) {
        let mut calls = self.calls.lock();
        let unused = calls.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, cell) && !cell.initialized() && Arc::strong_count(cell) == 2
        });
        if unused {
            calls.remove(key);
        }
    }

    /// Drop whatever is remembered for `key`.
    pub fn forget(&self, key: &str) {
        self.calls.lock().remove(key);
    }

    /// Drop the result remembered for `key` if `matches` accepts it.
    ///
    /// In-flight calls and results stored after the caller looked are kept.
    pub fn forget_if(&self, key: &str, matches: impl FnOnce(&T) -> bool) {
        let mut calls = self.calls.lock();
        let stale = calls
            .get(key)
            .and_then(|cell| cell.get())
            .is_some_and(matches);
        if stale {
            calls.remove(key);
        }
    }

    /// Keys with a remembered or in-flight call.
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
