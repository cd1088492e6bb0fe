//! Filter selection and its encoding into a query fragment.
//!
//! A [`FilterSelection`] is what the user picked in the filter sheet. It is
//! encoded into a [`FilterExpression`], an opaque fragment appended to the
//! product query string. Fields are emitted in a stable order (brand, price,
//! type, weight) and absent fields are left out entirely, so the encoder
//! cannot produce a malformed fragment.

use std::fmt::{self, Write as _};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::TermId;

/// A taxonomy term (brand, product type, weight...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// Term ID as known to the commerce API.
    pub term_id: TermId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
}

impl Term {
    /// Create a term with only an ID.
    #[must_use]
    pub fn with_id(term_id: TermId) -> Self {
        Self {
            term_id,
            name: String::new(),
            slug: String::new(),
        }
    }
}

/// Inclusive price range. `min` never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    min: Decimal,
    max: Decimal,
}

impl PriceRange {
    /// Create a range, swapping the bounds if they arrive reversed.
    #[must_use]
    pub fn new(a: Decimal, b: Decimal) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> Decimal {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> Decimal {
        self.max
    }
}

/// The user's filter choices. Each selection replaces the previous one
/// wholesale; fields are never merged across selections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Brand term.
    pub brand: Option<Term>,
    /// Price range.
    pub price_range: Option<PriceRange>,
    /// Product type term.
    pub type_term: Option<Term>,
    /// Weight term.
    pub weight_term: Option<Term>,
}

impl FilterSelection {
    /// Whether no field is applied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.price_range.is_none()
            && self.type_term.is_none()
            && self.weight_term.is_none()
    }
}

/// Encoded filter fragment, e.g. `&pa_brand=7&min_price=10&max_price=50`.
///
/// Empty when no filter is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterExpression(String);

impl FilterExpression {
    /// Encode a selection. Field order is brand, price, type, weight.
    #[must_use]
    pub fn encode(selection: &FilterSelection) -> Self {
        let mut out = String::new();

        // Writing into a String cannot fail.
        if let Some(brand) = &selection.brand {
            let _ = write!(out, "&pa_brand={}", brand.term_id);
        }
        if let Some(range) = &selection.price_range {
            let _ = write!(
                out,
                "&min_price={}&max_price={}",
                range.min().normalize(),
                range.max().normalize()
            );
        }
        if let Some(kind) = &selection.type_term {
            let _ = write!(out, "&pa_filters={}", kind.term_id);
        }
        if let Some(weight) = &selection.weight_term {
            let _ = write!(out, "&pa_weight={}", weight.term_id);
        }

        Self(out)
    }

    /// The fragment as appended to the query string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no filter is applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Price bounds offered by the filter sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBounds {
    /// Cheapest product in scope.
    pub min: Decimal,
    /// Most expensive product in scope.
    pub max: Decimal,
}

/// Filter metadata for a resource: the terms the user may pick from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Available brands.
    pub brands: Vec<Term>,
    /// Available product types.
    pub types: Vec<Term>,
    /// Available weights.
    pub weights: Vec<Term>,
    /// Price bounds, if the API reports them.
    pub price: Option<PriceBounds>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(id: i64) -> Term {
        Term::with_id(TermId::new(id))
    }

    #[test]
    fn test_encode_empty_selection() {
        let expr = FilterExpression::encode(&FilterSelection::default());
        assert!(expr.is_empty());
        assert_eq!(expr, FilterExpression::default());
    }

    #[test]
    fn test_encode_brand_only() {
        let selection = FilterSelection {
            brand: Some(term(7)),
            ..FilterSelection::default()
        };
        assert_eq!(FilterExpression::encode(&selection).as_str(), "&pa_brand=7");
    }

    #[test]
    fn test_encode_price_only() {
        let selection = FilterSelection {
            price_range: Some(PriceRange::new(Decimal::from(10), Decimal::from(50))),
            ..FilterSelection::default()
        };
        assert_eq!(
            FilterExpression::encode(&selection).as_str(),
            "&min_price=10&max_price=50"
        );
    }

    #[test]
    fn test_encode_uses_stable_field_order() {
        let selection = FilterSelection {
            weight_term: Some(term(9)),
            type_term: Some(term(5)),
            price_range: Some(PriceRange::new(Decimal::new(105, 1), Decimal::from(20))),
            brand: Some(term(7)),
        };
        assert_eq!(
            FilterExpression::encode(&selection).as_str(),
            "&pa_brand=7&min_price=10.5&max_price=20&pa_filters=5&pa_weight=9"
        );
    }

    #[test]
    fn test_price_range_swaps_reversed_bounds() {
        let range = PriceRange::new(Decimal::from(50), Decimal::from(10));
        assert_eq!(range.min(), Decimal::from(10));
        assert_eq!(range.max(), Decimal::from(50));
    }

    #[test]
    fn test_selection_replaces_rather_than_merges() {
        let first = FilterSelection {
            brand: Some(term(7)),
            ..FilterSelection::default()
        };
        let second = FilterSelection {
            price_range: Some(PriceRange::new(Decimal::from(10), Decimal::from(50))),
            ..FilterSelection::default()
        };
        assert_eq!(FilterExpression::encode(&first).as_str(), "&pa_brand=7");
        assert_eq!(
            FilterExpression::encode(&second).as_str(),
            "&min_price=10&max_price=50"
        );
        assert!(!second.is_empty());
    }
}
