use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::headers::Headers;

type HandlerFn = dyn Fn(&str, &Headers) + Send + Sync;

/// A subscriber callback, invoked with the MESSAGE body and headers.
///
/// Cloning a handler yields the same handler: two clones registered for one
/// destination are delivered to once. Closures wrapped separately are
/// distinct handlers even if their code is identical.
#[derive(Clone)]
pub struct MessageHandler(Arc<HandlerFn>);

impl MessageHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &Headers) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &MessageHandler) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// Run the callback, containing a panic to this one invocation.
    ///
    /// Returns `false` if the callback panicked.
    pub(crate) fn invoke(&self, body: &str, headers: &Headers) -> bool {
        panic::catch_unwind(AssertUnwindSafe(|| (self.0)(body, headers))).is_ok()
    }
}

impl fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MessageHandler")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

/// Destination -> set of handlers.
///
/// Destinations keep their registration order, which is the order they are
/// re-subscribed in. Handlers have set semantics per destination. There is
/// no removal; the registry is only cleared wholesale.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: Vec<(String, Vec<MessageHandler>)>,
}

impl Registry {
    /// Register `handler` for `destination`. Returns `false` if that exact
    /// handler was already registered there.
    pub(crate) fn insert(&mut self, destination: String, handler: MessageHandler) -> bool {
        let idx = match self.entries.iter().position(|(d, _)| *d == destination) {
            Some(idx) => idx,
            None => {
                self.entries.push((destination, Vec::new()));
                self.entries.len() - 1
            }
        };
        let handlers = &mut self.entries[idx].1;
        if handlers.iter().any(|h| h.same_as(&handler)) {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Snapshot of the handlers for `destination`, so callbacks can run
    /// without holding the client lock.
    pub(crate) fn handlers(&self, destination: &str) -> Vec<MessageHandler> {
        self.entries
            .iter()
            .find(|(d, _)| d == destination)
            .map(|(_, handlers)| handlers.clone())
            .unwrap_or_default()
    }

    pub(crate) fn destinations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(d, _)| d.as_str())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
