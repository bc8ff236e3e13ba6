//! Message listeners and dispatch.
//!
//! Listeners declare which message kinds they accept. Every decoded message
//! is offered to the registered listeners in registration order, on the
//! receive task.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use weart_client::{CallbackListener, MessageKind};
//!
//! let listener = CallbackListener::new([MessageKind::Tracking], |message| {
//!     println!("{message:?}");
//! });
//! let id = connection.add_listener(Arc::new(listener));
//! connection.remove_listener(id);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::protocol::{Message, MessageKind};

// ============================================================================
// MessageListener
// ============================================================================

/// Consumer of decoded messages.
///
/// `on_message` runs on the receive task. A handler that blocks delays
/// every message behind it.
pub trait MessageListener: Send + Sync {
    /// Returns `true` if this listener wants messages of `kind`.
    fn accepts(&self, kind: MessageKind) -> bool;

    /// Handles an accepted message.
    fn on_message(&self, message: &Message);
}

// ============================================================================
// CallbackListener
// ============================================================================

/// Listener built from a kind list and a closure.
pub struct CallbackListener {
    kinds: Vec<MessageKind>,
    callback: Box<dyn Fn(&Message) + Send + Sync>,
}

impl CallbackListener {
    /// Creates a listener for `kinds` that forwards to `callback`.
    pub fn new<F>(kinds: impl IntoIterator<Item = MessageKind>, callback: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        Self {
            kinds: kinds.into_iter().collect(),
            callback: Box::new(callback),
        }
    }
}

impl MessageListener for CallbackListener {
    fn accepts(&self, kind: MessageKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn on_message(&self, message: &Message) {
        (self.callback)(message);
    }
}

impl fmt::Debug for CallbackListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackListener")
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Handle returned when a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// ListenerRegistry
// ============================================================================

type ListenerEntry = (ListenerId, Arc<dyn MessageListener>);

/// Ordered listener collection.
///
/// Dispatch iterates over a snapshot, so handlers may add or remove
/// listeners; changes apply from the next message.
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Appends a listener.
    pub(crate) fn add(&self, listener: Arc<dyn MessageListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, listener));
        trace!(%id, "Listener added");
        id
    }

    /// Removes a listener. Returns `false` if `id` was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if removed {
            trace!(%id, "Listener removed");
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Offers `message` to every accepting listener; returns how many took it.
    pub(crate) fn dispatch(&self, message: &Message) -> usize {
        let snapshot: Vec<ListenerEntry> = self.entries.read().clone();
        let kind = message.kind();

        let mut delivered = 0;
        for (_, listener) in snapshot {
            if listener.accepts(kind) {
                listener.on_message(message);
                delivered += 1;
            }
        }
        delivered
    }
}

// ============================================================================
// Tests
// ============================================================================
