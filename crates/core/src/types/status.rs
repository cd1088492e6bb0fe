//! Status enums for catalog and cart entities.

use serde::{Deserialize, Serialize};

/// Product stock status.
///
/// Maps to the commerce API's `product_stock_status` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockStatus {
    #[default]
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "outofstock")]
    OutOfStock,
}

impl StockStatus {
    /// Whether the product can be purchased right now.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        matches!(self, Self::InStock)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InStock => write!(f, "instock"),
            Self::OutOfStock => write!(f, "outofstock"),
        }
    }
}

/// Lifecycle of a remote fetch as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// The first page of the current query is in flight.
    Loading,
    /// The last fetch for the current query succeeded.
    Success,
    /// The last fetch for the current query failed.
    Error,
}
