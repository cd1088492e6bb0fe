//! A product listing screen: one resource, its filters and sort, its pages.
//!
//! Filter and sort changes go through [`QueryState`]; the listing reloads the
//! catalog only when the derived query identity actually changed.

use std::sync::Arc;

use shopfront_core::{
    FilterOptions, FilterSelection, ProductSummary, ResourceRef, ResourceType, SortOrder,
};
use tokio::sync::{OnceCell, watch};
use tracing::{debug, instrument};

use crate::catalog::{CatalogFetchController, CatalogState, FetchOutcome, QueryState};
use crate::gateway::{CatalogGateway, GatewayError};

/// Listing of products for a single category, brand or tag.
pub struct ProductListing<G> {
    gateway: Arc<G>,
    query: watch::Sender<QueryState>,
    catalog: CatalogFetchController<G>,
    filter_options: OnceCell<FilterOptions>,
}

impl<G: CatalogGateway> ProductListing<G> {
    /// Listing for `resource`, newest first and unfiltered. Nothing is fetched
    /// until [`open`](Self::open).
    #[must_use]
    pub fn new(gateway: Arc<G>, resource: ResourceRef) -> Self {
        Self::with_state(gateway, QueryState::new(resource))
    }

    /// Listing starting from pre-applied filters and sort.
    #[must_use]
    pub fn with_state(gateway: Arc<G>, state: QueryState) -> Self {
        let (query, _) = watch::channel(state);
        Self {
            catalog: CatalogFetchController::new(Arc::clone(&gateway)),
            gateway,
            query,
            filter_options: OnceCell::new(),
        }
    }

    /// Load the first page for the current query.
    #[instrument(skip(self))]
    pub async fn open(&self) -> FetchOutcome {
        let query = self.query.borrow().query();
        self.catalog.load(query).await
    }

    /// Filter metadata for this resource. Fetched once and reused.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the metadata cannot be fetched; the next
    /// call tries again.
    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> Result<FilterOptions, GatewayError> {
        let resource = self.query.borrow().resource().clone();
        self.filter_options
            .get_or_try_init(|| async {
                self.gateway
                    .fetch_filter_metadata(&resource.slug, resource.kind == ResourceType::Brand)
                    .await
            })
            .await
            .cloned()
    }

    /// Replace the applied filters. Reloads only if the query changed.
    #[instrument(skip(self, selection))]
    pub async fn apply_filters(&self, selection: &FilterSelection) -> FetchOutcome {
        let mut query = None;
        self.query.send_if_modified(|state| {
            let changed = state.set_filters(selection);
            if changed {
                query = Some(state.query());
            }
            changed
        });

        match query {
            Some(query) => {
                debug!(filter = %query.filter_expression, "Filters changed");
                self.catalog.load(query).await
            }
            None => FetchOutcome::Skipped,
        }
    }

    /// Replace the sort order. Reloads only if the query changed.
    #[instrument(skip(self, sort))]
    pub async fn apply_sort(&self, sort: impl Into<SortOrder>) -> FetchOutcome {
        let sort = sort.into();
        let mut query = None;
        self.query.send_if_modified(|state| {
            let changed = state.set_sort(sort);
            if changed {
                query = Some(state.query());
            }
            changed
        });

        match query {
            Some(query) => {
                debug!(
                    sort_key = %query.sort_key,
                    sort_direction = %query.sort_direction,
                    "Sort changed"
                );
                self.catalog.load(query).await
            }
            None => FetchOutcome::Skipped,
        }
    }

    /// Fetch the next page, if any.
    pub async fn fetch_next_page(&self) -> FetchOutcome {
        self.catalog.fetch_next_page().await
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) -> FetchOutcome {
        self.catalog.refetch().await
    }

    /// Products across all pages, in fetch order.
    #[must_use]
    pub fn products(&self) -> Vec<ProductSummary> {
        self.catalog.products()
    }

    /// Total reported by the first page.
    #[must_use]
    pub fn total_records(&self) -> Option<u64> {
        self.catalog.snapshot().total_records()
    }

    /// Current fetch state.
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.catalog.snapshot()
    }

    /// Current filter and sort state.
    #[must_use]
    pub fn query_state(&self) -> QueryState {
        self.query.borrow().clone()
    }

    /// Subscribe to filter and sort changes.
    #[must_use]
    pub fn subscribe_query(&self) -> watch::Receiver<QueryState> {
        self.query.subscribe()
    }

    /// The underlying fetch controller.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogFetchController<G> {
        &self.catalog
    }
}
