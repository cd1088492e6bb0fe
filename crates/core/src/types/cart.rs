//! Cart types.

use serde::{Deserialize, Serialize, Serializer};

use super::id::{ProductId, VariationId};
use super::price::Price;

/// Quantity added by a single add-to-cart press.
pub const DEFAULT_ADD_QUANTITY: u32 = 1;

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Cart line key assigned by the API.
    pub key: String,
    /// Product ID.
    pub product_id: ProductId,
    /// Variation ID, if a variant was bought.
    pub variation_id: Option<VariationId>,
    /// Product name.
    pub name: String,
    /// Quantity.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: Option<Price>,
    /// Line total.
    pub line_total: Option<Price>,
    /// Image URL.
    pub image_ref: Option<String>,
}

/// Whether the cart has anything in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    #[default]
    Empty,
    Active,
}

/// The cart contents as last fetched. Only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Lines in API order.
    pub items: Vec<CartLineItem>,
    /// Derived from `items`.
    pub status: CartStatus,
}

impl CartSnapshot {
    /// Build a snapshot from its lines.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let status = if items.is_empty() {
            CartStatus::Empty
        } else {
            CartStatus::Active
        };
        Self { items, status }
    }

    /// Sum of line quantities, saturating at `u32::MAX`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity))
    }

    /// Sum of line totals, if every line has one.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        let mut lines = self.items.iter();
        let first = lines.next()?.line_total?;
        lines.try_fold(first, |acc, line| {
            let total = line.line_total?;
            (total.currency_code == acc.currency_code)
                .then(|| Price::new(acc.amount + total.amount, acc.currency_code))
        })
    }

    /// Checkout is only offered for a non-empty cart.
    #[must_use]
    pub fn can_checkout(&self) -> bool {
        matches!(self.status, CartStatus::Active)
    }
}

/// Body of an add-to-cart call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddToCartRequest {
    /// Product to add.
    pub product_id: ProductId,
    /// Quantity to add.
    pub quantity: u32,
    /// Selected variant. Sent as `""` when the product has none.
    #[serde(serialize_with = "serialize_variation_id")]
    pub variation_id: Option<VariationId>,
}

impl AddToCartRequest {
    /// A single unit of a product, optionally a specific variant.
    #[must_use]
    pub const fn single(product_id: ProductId, variation_id: Option<VariationId>) -> Self {
        Self {
            product_id,
            quantity: DEFAULT_ADD_QUANTITY,
            variation_id,
        }
    }
}

fn serialize_variation_id<S: Serializer>(
    value: &Option<VariationId>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(id) => serializer.serialize_str(&id.to_string()),
        None => serializer.serialize_str(""),
    }
}
