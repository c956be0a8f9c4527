//! Event registry: kind → ordered handler list, with per-handler fault isolation.
//!
//! # Panics inside handlers
//!
//! A handler that panics is caught with [`std::panic::catch_unwind`] around
//! that single invocation.  The panic is logged and the remaining handlers
//! still run; [`EventRegistry::publish`] itself always returns normally.
//!
//! # Re-entrancy
//!
//! `publish` copies the handler list for the kind and releases the lock
//! before calling anything, so a handler may publish further events or
//! subscribe new handlers.  Handlers subscribed during a publish are invoked
//! from the next publish onwards.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tracing::error;

use super::Event;

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Mapping from event kind to the handlers subscribed to it.
///
/// There is no unsubscribe: handlers live as long as the registry.
pub struct EventRegistry<E: Event> {
    handlers: RwLock<HashMap<E::Kind, Vec<Handler<E>>>>,
}

impl<E: Event> EventRegistry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `handler` for `kind`.
    ///
    /// Handlers for the same kind are invoked in the order they were
    /// subscribed.  Subscribing the same closure twice registers it twice.
    pub fn subscribe<F>(&self, kind: E::Kind, handler: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    /// Invokes every handler registered for `event.kind()`, synchronously and
    /// in registration order.
    ///
    /// Publishing a kind with no subscribers does nothing.
    pub fn publish(&self, event: E) {
        let kind = event.kind();
        let snapshot: Vec<Handler<E>> = {
            let handlers = self
                .handlers
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match handlers.get(&kind) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for handler in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                error!(
                    "unhandled panic in event handler for {kind:?}: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    /// Number of handlers currently registered for `kind`.
    pub fn subscriber_count(&self, kind: E::Kind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl<E: Event> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self
            .handlers
            .read()
            .map(|h| h.len())
            .unwrap_or_default();
        f.debug_struct("EventRegistry").field("kinds", &kinds).finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
