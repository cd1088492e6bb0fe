//! Cart refresh and the transient preview shown after an add.

use std::sync::Arc;
use std::time::Duration;

use shopfront_core::CartSnapshot;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::gateway::{CartGateway, GatewayError};

/// Observable state of a [`CartSyncController`].
#[derive(Debug, Clone, Default)]
pub struct CartSyncState {
    /// Last successfully fetched cart. Replaced as a whole, never patched.
    pub snapshot: Option<CartSnapshot>,
    /// Whether the preview surface should be shown.
    pub preview_visible: bool,
    /// User-facing message of the last failed refresh.
    pub last_error: Option<String>,
    epoch: u64,
}

/// What a refresh ended up doing.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The cart was replaced and the preview shown.
    Shown,
    /// A newer refresh started; this one left the preview alone.
    Stale,
    /// The fetch failed; the previous snapshot was kept and the preview hidden.
    Failed(GatewayError),
}

/// Sole writer of the cart snapshot.
pub struct CartSyncController<G> {
    gateway: Arc<G>,
    state: Arc<watch::Sender<CartSyncState>>,
    preview_delay: Duration,
}

impl<G> Clone for CartSyncController<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            preview_delay: self.preview_delay,
        }
    }
}

impl<G: CartGateway> CartSyncController<G> {
    /// Create a controller that waits `preview_delay` before showing the preview.
    #[must_use]
    pub fn new(gateway: Arc<G>, preview_delay: Duration) -> Self {
        let (state, _) = watch::channel(CartSyncState::default());
        Self {
            gateway,
            state: Arc::new(state),
            preview_delay,
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> CartSyncState {
        self.state.borrow().clone()
    }

    /// Last fetched cart, if any.
    #[must_use]
    pub fn cart(&self) -> Option<CartSnapshot> {
        self.state.borrow().snapshot.clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSyncState> {
        self.state.subscribe()
    }

    /// Fetch the cart, replace the snapshot, then show the preview after the
    /// display delay.
    ///
    /// Only the latest refresh may touch the state; an older one finishing
    /// late is reported as [`RefreshOutcome::Stale`].
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) -> RefreshOutcome {
        let mut epoch = 0;
        self.state.send_if_modified(|state| {
            state.epoch += 1;
            epoch = state.epoch;
            false
        });

        let result = self.gateway.get_cart().await;

        let mut outcome = None;
        self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            match result {
                Ok(snapshot) => {
                    debug!(epoch, lines = snapshot.items.len(), "Cart refreshed");
                    state.snapshot = Some(snapshot);
                    state.last_error = None;
                }
                Err(err) => {
                    warn!(epoch, error = %err, "Cart refresh failed");
                    state.preview_visible = false;
                    state.last_error = Some(err.user_message());
                    outcome = Some(RefreshOutcome::Failed(err));
                }
            }
            true
        });

        if let Some(outcome) = outcome {
            return outcome;
        }
        if self.state.borrow().epoch != epoch {
            debug!(epoch, "Discarding stale cart refresh");
            return RefreshOutcome::Stale;
        }

        tokio::time::sleep(self.preview_delay).await;

        let shown = self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            state.preview_visible = true;
            true
        });
        if shown {
            RefreshOutcome::Shown
        } else {
            debug!(epoch, "Newer refresh started, not showing preview");
            RefreshOutcome::Stale
        }
    }

    /// Hide the preview. The snapshot is kept.
    pub fn dismiss_preview(&self) {
        self.state.send_if_modified(|state| {
            let changed = state.preview_visible;
            state.preview_visible = false;
            changed
        });
    }
}
