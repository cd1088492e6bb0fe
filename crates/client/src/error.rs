//! Errors surfaced by the add-to-cart flow.

use shopfront_core::VariationId;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors from [`AddToCartController`](crate::cart::AddToCartController).
#[derive(Debug, Error)]
pub enum AddToCartError {
    /// A product detail fetch or the add call failed. The flow is back at idle.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// An add call is already in flight.
    #[error("An item is already being added to the cart")]
    Busy,

    /// `confirm_variant` was called with no variant selection open.
    #[error("No variant selection is pending")]
    NoSelectionPending,

    /// The confirmed variant is not one of the offered options.
    #[error("Unknown variant: {0}")]
    UnknownVariant(VariationId),
}

impl AddToCartError {
    /// Text to show the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
