//! Catalog types: product summaries, pages and the query identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::FilterExpression;
use super::id::{CategoryId, ProductId, ResourceId};
use super::price::Price;
use super::status::StockStatus;

// =============================================================================
// Products
// =============================================================================

/// Category a product is listed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

/// A product as it appears in a listing page.
///
/// Immutable once fetched; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Current price, absent when the API reports none (e.g. variable products).
    pub price: Option<Price>,
    /// URL of the listing image.
    pub image_ref: Option<String>,
    /// Categories in the order the API returned them.
    pub categories: Vec<Category>,
    /// Stock status.
    pub stock_status: StockStatus,
}

impl ProductSummary {
    /// Category names joined for a single display line.
    #[must_use]
    pub fn categories_label(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Out-of-stock products have no add-to-cart affordance.
    #[must_use]
    pub const fn can_add_to_cart(&self) -> bool {
        self.stock_status.is_purchasable()
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One-based page number used to request a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(u32);

impl PageCursor {
    /// Cursor of the first page of any query.
    pub const FIRST: Self = Self(1);

    /// Create a cursor for the given one-based page number.
    #[must_use]
    pub const fn new(page: u32) -> Self {
        Self(if page == 0 { 1 } else { page })
    }

    /// The one-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.0
    }

    /// Cursor of the page following this one.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single product page fetch.
///
/// Pages accumulate in fetch order and are never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Products on this page, in API order.
    pub products: Vec<ProductSummary>,
    /// Total number of products matching the query.
    pub total_records: u64,
    /// Cursor this page was fetched with.
    pub page_cursor: PageCursor,
}

// =============================================================================
// Query identity
// =============================================================================

/// Kind of resource a listing is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    #[default]
    Category,
    Brand,
    Tag,
}

impl ResourceType {
    /// Wire name of the resource type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Brand => "brand",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown resource type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resource type: {0} (expected category, brand or tag)")]
pub struct InvalidResourceType(pub String);

impl FromStr for ResourceType {
    type Err = InvalidResourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "brand" => Ok(Self::Brand),
            "tag" => Ok(Self::Tag),
            _ => Err(InvalidResourceType(s.to_string())),
        }
    }
}

/// The resource a listing screen is opened for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource ID.
    pub id: ResourceId,
    /// Resource kind.
    pub kind: ResourceType,
    /// URL slug, used to look up filter metadata.
    pub slug: String,
}

/// Field the API sorts products by (e.g. `ID`, `price`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKey(String);

impl SortKey {
    /// Create a sort key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as sent to the API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::new("ID")
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Wire name of the direction.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown sort direction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sort direction: {0} (expected asc or desc)")]
pub struct InvalidSortDirection(pub String);

impl FromStr for SortDirection {
    type Err = InvalidSortDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(InvalidSortDirection(s.to_string())),
        }
    }
}

/// Sort key and direction pair. Defaults to newest first (`ID`, `desc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct SortOrder {
    /// Field to sort by.
    pub key: SortKey,
    /// Direction.
    pub direction: SortDirection,
}

impl SortOrder {
    /// Create a sort order.
    #[must_use]
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: SortKey::new(key),
            direction,
        }
    }
}

/// Everything that determines which products a listing shows.
///
/// Any field change invalidates accumulated pages and restarts pagination
/// from the first page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Resource the listing is scoped to.
    pub resource_id: ResourceId,
    /// Resource kind.
    pub resource_type: ResourceType,
    /// Encoded filter fragment.
    pub filter_expression: FilterExpression,
    /// Sort field.
    pub sort_key: SortKey,
    /// Sort direction.
    pub sort_direction: SortDirection,
}

impl CatalogQuery {
    /// Derive the query identity from a resource, a filter and a sort order.
    #[must_use]
    pub fn derive(resource: &ResourceRef, filter: &FilterExpression, sort: &SortOrder) -> Self {
        Self {
            resource_id: resource.id,
            resource_type: resource.kind,
            filter_expression: filter.clone(),
            sort_key: sort.key.clone(),
            sort_direction: sort.direction,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::id::CategoryId;

    fn resource() -> ResourceRef {
        ResourceRef {
            id: ResourceId::new(12),
            kind: ResourceType::Category,
            slug: "fruits".to_string(),
        }
    }

    #[test]
    fn test_page_cursor_starts_at_one() {
        assert_eq!(PageCursor::default().page(), 1);
        assert_eq!(PageCursor::new(0), PageCursor::FIRST);
        assert_eq!(PageCursor::FIRST.next().page(), 2);
    }

    #[test]
    fn test_sort_order_default_is_newest_first() {
        let sort = SortOrder::default();
        assert_eq!(sort.key.as_str(), "ID");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_query_identity_tracks_every_field() {
        let base = CatalogQuery::derive(
            &resource(),
            &FilterExpression::default(),
            &SortOrder::default(),
        );
        let same = CatalogQuery::derive(
            &resource(),
            &FilterExpression::default(),
            &SortOrder::default(),
        );
        assert_eq!(base, same);

        let resorted = CatalogQuery::derive(
            &resource(),
            &FilterExpression::default(),
            &SortOrder::new("ID", SortDirection::Asc),
        );
        assert_ne!(base, resorted);

        let mut other_resource = resource();
        other_resource.kind = ResourceType::Brand;
        let rescoped = CatalogQuery::derive(
            &other_resource,
            &FilterExpression::default(),
            &SortOrder::default(),
        );
        assert_ne!(base, rescoped);
    }

    #[test]
    fn test_categories_label_and_stock_guard() {
        let product = ProductSummary {
            id: ProductId::new(1),
            name: "Dates".to_string(),
            price: None,
            image_ref: None,
            categories: vec![
                Category {
                    id: CategoryId::new(3),
                    name: "Dried Fruit".to_string(),
                },
                Category {
                    id: CategoryId::new(4),
                    name: "Snacks".to_string(),
                },
            ],
            stock_status: StockStatus::OutOfStock,
        };
        assert_eq!(product.categories_label(), "Dried Fruit, Snacks");
        assert!(!product.can_add_to_cart());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("brand".parse::<ResourceType>().unwrap(), ResourceType::Brand);
        assert!("shelf".parse::<ResourceType>().is_err());
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
    }
}
