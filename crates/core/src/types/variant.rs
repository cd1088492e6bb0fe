//! Product variants offered when adding a product to the cart.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariationId};
use super::price::Price;
use super::status::StockStatus;

/// A specific purchasable configuration of a product (e.g. a size or weight).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variation ID to send with the add-to-cart request.
    pub variation_id: VariationId,
    /// Option label (e.g. "500g").
    pub label: String,
    /// Variant price, when it differs from the product price.
    pub price: Option<Price>,
    /// Stock status of this variant.
    pub stock_status: StockStatus,
}

/// The options a product can be bought in.
///
/// Empty for simple products, which are added without a selection step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantSet {
    /// Name of the varying attribute (e.g. "Weight").
    pub attribute_label: String,
    /// Options in display order.
    pub options: Vec<Variant>,
}

impl VariantSet {
    /// Whether the product has no purchasable variants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Look up an option by variation ID.
    #[must_use]
    pub fn find(&self, variation_id: VariationId) -> Option<&Variant> {
        self.options
            .iter()
            .find(|variant| variant.variation_id == variation_id)
    }
}

/// Product detail as needed by the add-to-cart flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    /// Product ID.
    pub product_id: ProductId,
    /// Variants; empty for simple products.
    pub variants: VariantSet,
}
