//! Pagination and query state.
//!
//! Pure state: holds the applied filter expression and sort order for a
//! resource and derives the [`CatalogQuery`] identity from them. Setters
//! report whether the identity changed so callers only reload when it did.

use std::fmt;
use std::str::FromStr;

use shopfront_core::{
    CatalogQuery, FilterExpression, FilterSelection, ResourceRef, SortDirection, SortOrder,
};
use thiserror::Error;

/// Filter and sort state for one resource listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    resource: ResourceRef,
    sort: SortOrder,
    filter: FilterExpression,
}

impl QueryState {
    /// Newest first, no filters.
    #[must_use]
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource,
            sort: SortOrder::default(),
            filter: FilterExpression::default(),
        }
    }

    /// Replace the applied filters with `selection`.
    ///
    /// Selections replace each other wholesale; fields absent from
    /// `selection` are dropped. Returns whether the query identity changed.
    pub fn set_filters(&mut self, selection: &FilterSelection) -> bool {
        let filter = FilterExpression::encode(selection);
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        true
    }

    /// Replace the sort order. Returns whether the query identity changed.
    pub fn set_sort(&mut self, sort: SortOrder) -> bool {
        if sort == self.sort {
            return false;
        }
        self.sort = sort;
        true
    }

    /// The resource this state is scoped to.
    #[must_use]
    pub const fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Applied sort order.
    #[must_use]
    pub const fn sort(&self) -> &SortOrder {
        &self.sort
    }

    /// Applied filter expression.
    #[must_use]
    pub const fn filter(&self) -> &FilterExpression {
        &self.filter
    }

    /// Current query identity.
    #[must_use]
    pub fn query(&self) -> CatalogQuery {
        CatalogQuery::derive(&self.resource, &self.filter, &self.sort)
    }
}

// =============================================================================
// Sort presets
// =============================================================================

/// Sort choices offered on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    PriceLowToHigh,
    PriceHighToLow,
    Name,
    Popularity,
}

impl SortOption {
    /// Every preset, in display order.
    pub const ALL: [Self; 6] = [
        Self::Newest,
        Self::Oldest,
        Self::PriceLowToHigh,
        Self::PriceHighToLow,
        Self::Name,
        Self::Popularity,
    ];

    /// The sort order the API is asked for.
    #[must_use]
    pub fn order(self) -> SortOrder {
        match self {
            Self::Newest => SortOrder::new("ID", SortDirection::Desc),
            Self::Oldest => SortOrder::new("ID", SortDirection::Asc),
            Self::PriceLowToHigh => SortOrder::new("price", SortDirection::Asc),
            Self::PriceHighToLow => SortOrder::new("price", SortDirection::Desc),
            Self::Name => SortOrder::new("title", SortDirection::Asc),
            Self::Popularity => SortOrder::new("popularity", SortDirection::Desc),
        }
    }

    /// Short name, as accepted by `FromStr`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceLowToHigh => "price-asc",
            Self::PriceHighToLow => "price-desc",
            Self::Name => "name",
            Self::Popularity => "popularity",
        }
    }
}

impl From<SortOption> for SortOrder {
    fn from(option: SortOption) -> Self {
        option.order()
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown sort preset name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sort option: {0} (expected newest, oldest, price-asc, price-desc, name or popularity)")]
pub struct InvalidSortOption(pub String);

impl FromStr for SortOption {
    type Err = InvalidSortOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidSortOption(s.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopfront_core::{PriceRange, ResourceId, ResourceType, Term, TermId};

    use super::*;

    fn state() -> QueryState {
        QueryState::new(ResourceRef {
            id: ResourceId::new(12),
            kind: ResourceType::Category,
            slug: "dates".to_string(),
        })
    }

    fn brand(id: i64) -> FilterSelection {
        FilterSelection {
            brand: Some(Term::with_id(TermId::new(id))),
            ..FilterSelection::default()
        }
    }

    #[test]
    fn test_defaults() {
        let state = state();
        let query = state.query();
        assert_eq!(query.sort_key.as_str(), "ID");
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert!(query.filter_expression.is_empty());
    }

    #[test]
    fn test_set_filters_reports_identity_change() {
        let mut state = state();
        let before = state.query();

        assert!(state.set_filters(&brand(7)));
        assert_ne!(state.query(), before);

        let after = state.query();
        assert!(!state.set_filters(&brand(7)));
        assert_eq!(state.query(), after);
    }

    #[test]
    fn test_set_filters_replaces_previous_selection() {
        let mut state = state();
        state.set_filters(&brand(7));
        assert_eq!(state.filter().as_str(), "&pa_brand=7");

        state.set_filters(&FilterSelection {
            price_range: Some(PriceRange::new(Decimal::from(10), Decimal::from(50))),
            ..FilterSelection::default()
        });
        assert_eq!(state.filter().as_str(), "&min_price=10&max_price=50");
    }

    #[test]
    fn test_clearing_filters_changes_identity() {
        let mut state = state();
        state.set_filters(&brand(7));
        assert!(state.set_filters(&FilterSelection::default()));
        assert!(state.filter().is_empty());
        assert!(!state.set_filters(&FilterSelection::default()));
    }

    #[test]
    fn test_set_sort_reports_identity_change() {
        let mut state = state();
        assert!(!state.set_sort(SortOption::Newest.order()));
        assert!(state.set_sort(SortOption::PriceLowToHigh.order()));

        let query = state.query();
        assert_eq!(query.sort_key.as_str(), "price");
        assert_eq!(query.sort_direction, SortDirection::Asc);
        assert!(!state.set_sort(SortOrder::new("price", SortDirection::Asc)));
    }

    #[test]
    fn test_sort_option_parse() {
        assert_eq!("price-desc".parse::<SortOption>().unwrap(), SortOption::PriceHighToLow);
        assert_eq!("Newest".parse::<SortOption>().unwrap(), SortOption::Newest);
        assert!("cheapest".parse::<SortOption>().is_err());
    }

    #[test]
    fn test_sort_option_round_trips_display() {
        for option in SortOption::ALL {
            assert_eq!(option.to_string().parse::<SortOption>().unwrap(), option);
        }
    }
}
