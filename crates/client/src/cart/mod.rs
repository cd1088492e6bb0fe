//! Cart mutation and synchronization.
//!
//! - [`AddToCartController`] runs the add flow, resolving variants first
//! - [`CartSyncController`] owns the cart snapshot and the post-add preview
//! - [`SharedCartCounter`] is the session-wide item count other screens watch

mod add_flow;
mod counter;
mod sync;

pub use add_flow::{
    AddOutcome, AddToCartController, FlowCommand, FlowEvent, FlowMachine, FlowState,
};
pub use counter::SharedCartCounter;
pub use sync::{CartSyncController, CartSyncState, RefreshOutcome};
