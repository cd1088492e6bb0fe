//! Session-wide cart item counter.

use std::sync::Arc;

use tokio::sync::watch;

/// Number of items added to the cart this session, shared across screens.
///
/// Cloning shares the underlying cell. Only a completed add-to-cart flow
/// increments it; the session owner initializes and resets it.
#[derive(Debug, Clone)]
pub struct SharedCartCounter {
    inner: Arc<watch::Sender<u32>>,
}

impl SharedCartCounter {
    /// Counter starting at `initial`, e.g. the cart size at sign-in.
    #[must_use]
    pub fn new(initial: u32) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            inner: Arc::new(sender),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> u32 {
        *self.inner.borrow()
    }

    /// Receiver notified on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.inner.subscribe()
    }

    /// Back to zero, on sign-out.
    pub fn reset(&self) {
        self.inner.send_if_modified(|count| {
            let changed = *count != 0;
            *count = 0;
            changed
        });
    }

    /// Add one after a confirmed add. Returns the new value.
    pub(crate) fn increment(&self) -> u32 {
        let mut value = 0;
        self.inner.send_modify(|count| {
            *count = count.saturating_add(1);
            value = *count;
        });
        value
    }
}

impl Default for SharedCartCounter {
    fn default() -> Self {
        Self::new(0)
    }
}
