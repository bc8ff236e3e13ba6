//! Connection status and error observers.
//!
//! Each notification runs every observer on its own blocking task and waits
//! for all of them, bounded by a timeout. Observers still running when the
//! timeout fires are detached and left to finish on their own.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Error, ErrorType};

// ============================================================================
// Types
// ============================================================================

/// Called with `true` when the connection opens and `false` when it ends.
pub type ConnectionStatusCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Called when the connection fails to open, send, or receive.
pub type ErrorCallback = Arc<dyn Fn(ErrorType) + Send + Sync>;

/// Called on the receive task for every frame that fails to decode.
pub type DecodeErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Whole milliseconds of `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Observers
// ============================================================================

/// Ordered set of observers receiving a copyable value.
pub(crate) struct Observers<T> {
    name: &'static str,
    callbacks: RwLock<Vec<Arc<dyn Fn(T) + Send + Sync>>>,
}

impl<T> Observers<T>
where
    T: Copy + Send + 'static,
{
    /// Creates an empty set; `name` labels log records.
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Registers an observer.
    pub(crate) fn add(&self, callback: Arc<dyn Fn(T) + Send + Sync>) {
        self.callbacks.write().push(callback);
    }

    /// Returns the number of registered observers.
    pub(crate) fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Runs every observer with `value` and waits up to `limit` for them.
    ///
    /// Returns `false` if some observer was detached after the timeout.
    pub(crate) async fn notify(&self, value: T, limit: Duration) -> bool {
        let snapshot = self.callbacks.read().clone();
        if snapshot.is_empty() {
            return true;
        }

        let mut tasks = JoinSet::new();
        for callback in snapshot {
            tasks.spawn_blocking(move || callback(value));
        }

        let joined = timeout(limit, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!(observer = self.name, error = %e, "Observer panicked");
                }
            }
        })
        .await;

        if joined.is_err() {
            warn!(
                observer = self.name,
                pending = tasks.len(),
                timeout_ms = saturating_millis(limit),
                "Observers exceeded timeout, detaching"
            );
            tasks.detach_all();
            return false;
        }

        debug!(observer = self.name, "Observers notified");
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
