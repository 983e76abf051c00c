//! Change-feed subscription handle
//!
//! A [`Subscription`] is the scoped-resource half of the
//! subscribe/unsubscribe pairing: acquiring one registers a listener with
//! the backend, and releasing it (explicitly via [`Subscription::close`] or
//! implicitly on drop) stops delivery. After release no further events are
//! yielded, including events already buffered in the channel.

use crate::event::RowChange;
use tokio::sync::mpsc;

/// Callback that removes this listener from the backend's registry
type Unregister = Box<dyn FnOnce() + Send>;

/// Handle to one live change-feed registration
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<RowChange>,
    unregister: Option<Unregister>,
    closed: bool,
}

impl Subscription {
    /// Wrap a delivery channel and its unregister hook
    ///
    /// Backends call this from their `subscribe` implementation; consumers
    /// only ever receive a ready-made handle.
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<RowChange>, unregister: Unregister) -> Self {
        Self {
            rx,
            unregister: Some(unregister),
            closed: false,
        }
    }

    /// Await the next change notification
    ///
    /// Returns `None` once the subscription is closed (locally or by the
    /// backend dropping its sender).
    pub async fn next(&mut self) -> Option<RowChange> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop delivery immediately
    ///
    /// Idempotent. Buffered events are discarded, not yielded.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.rx.close();
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }

    /// Whether this handle still delivers events
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.closed)
            .finish()
    }
}
