//! Catalog browsing: query identity and paginated fetching.

mod controller;
mod query;

pub use controller::{CatalogFetchController, CatalogState, FetchOutcome};
pub use query::{InvalidSortOption, QueryState, SortOption};
