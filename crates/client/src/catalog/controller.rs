//! Incremental paginated fetching for one listing.
//!
//! Every first-page request (`load`, `refetch`) opens a new epoch. Responses
//! are tagged with the epoch they were issued under and dropped on arrival
//! if a newer one has started, so the latest query wins regardless of the
//! order responses come back in.

use std::sync::Arc;

use shopfront_core::{CatalogQuery, FetchStatus, Page, PageCursor, ProductSummary};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::gateway::{CatalogGateway, GatewayError};

/// Observable state of a [`CatalogFetchController`].
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    /// Query the pages belong to.
    pub query: Option<CatalogQuery>,
    /// Pages in fetch order.
    pub pages: Vec<Page>,
    /// Overall fetch status.
    pub status: FetchStatus,
    /// Whether a request is outstanding.
    pub is_fetching: bool,
    /// User-facing message of the last failure.
    pub error: Option<String>,
    epoch: u64,
    exhausted: bool,
}

impl CatalogState {
    /// Total reported by the first page of the current query.
    #[must_use]
    pub fn total_records(&self) -> Option<u64> {
        self.pages.first().map(|page| page.total_records)
    }

    /// Products accumulated across all pages.
    #[must_use]
    pub fn accumulated_count(&self) -> usize {
        self.pages.iter().map(|page| page.products.len()).sum()
    }

    /// Whether more pages are known to exist.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        !self.exhausted
            && self
                .total_records()
                .is_some_and(|total| (self.accumulated_count() as u64) < total)
    }

    /// Products in fetch order.
    pub fn products(&self) -> impl Iterator<Item = &ProductSummary> {
        self.pages.iter().flat_map(|page| page.products.iter())
    }

    /// Request generation the state belongs to.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// What a fetch command ended up doing.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response was applied to the state.
    Applied,
    /// Nothing was requested.
    Skipped,
    /// The response arrived after a newer request started and was dropped.
    Stale,
    /// The request failed; accumulated pages were kept.
    Failed(GatewayError),
}

impl FetchOutcome {
    /// Whether the response made it into the state.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Drives page loading for a listing against a [`CatalogGateway`].
pub struct CatalogFetchController<G> {
    gateway: Arc<G>,
    state: Arc<watch::Sender<CatalogState>>,
}

impl<G> Clone for CatalogFetchController<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
        }
    }
}

impl<G: CatalogGateway> CatalogFetchController<G> {
    /// Create an idle controller.
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        let (state, _) = watch::channel(CatalogState::default());
        Self {
            gateway,
            state: Arc::new(state),
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    /// Accumulated products in fetch order.
    #[must_use]
    pub fn products(&self) -> Vec<ProductSummary> {
        self.state.borrow().products().cloned().collect()
    }

    /// Start over for `query`: drop all pages and fetch the first one.
    #[instrument(skip(self, query), fields(resource_id = %query.resource_id))]
    pub async fn load(&self, query: CatalogQuery) -> FetchOutcome {
        let mut epoch = 0;
        self.state.send_modify(|state| {
            state.epoch += 1;
            epoch = state.epoch;
            state.query = Some(query.clone());
            state.pages.clear();
            state.exhausted = false;
            state.status = FetchStatus::Loading;
            state.is_fetching = true;
            state.error = None;
        });
        debug!(epoch, "Loading first page");

        let result = self.gateway.fetch_products(&query, PageCursor::FIRST).await;
        self.settle(epoch, result, true)
    }

    /// Fetch the first page of the current query again.
    ///
    /// Pages stay visible until the new first page arrives and then are
    /// replaced as a whole. Skipped when nothing was loaded yet.
    #[instrument(skip(self))]
    pub async fn refetch(&self) -> FetchOutcome {
        let mut target = None;
        self.state.send_if_modified(|state| {
            let Some(query) = state.query.clone() else {
                return false;
            };
            state.epoch += 1;
            state.status = FetchStatus::Loading;
            state.is_fetching = true;
            state.error = None;
            target = Some((state.epoch, query));
            true
        });

        let Some((epoch, query)) = target else {
            debug!("Nothing to refetch");
            return FetchOutcome::Skipped;
        };
        debug!(epoch, "Refetching first page");

        let result = self.gateway.fetch_products(&query, PageCursor::FIRST).await;
        self.settle(epoch, result, true)
    }

    /// Fetch the page after the last accumulated one.
    ///
    /// No-op while any fetch is in flight or when no further page exists.
    #[instrument(skip(self))]
    pub async fn fetch_next_page(&self) -> FetchOutcome {
        let mut target = None;
        self.state.send_if_modified(|state| {
            if state.is_fetching || !state.has_next_page() {
                return false;
            }
            let (Some(query), Some(last)) = (state.query.clone(), state.pages.last()) else {
                return false;
            };
            target = Some((state.epoch, query, last.page_cursor.next()));
            state.is_fetching = true;
            true
        });

        let Some((epoch, query, cursor)) = target else {
            debug!("No next page to fetch");
            return FetchOutcome::Skipped;
        };
        debug!(epoch, page = %cursor, "Fetching next page");

        let result = self.gateway.fetch_products(&query, cursor).await;
        self.settle(epoch, result, false)
    }

    /// Apply a response if its epoch is still current.
    fn settle(&self, epoch: u64, result: Result<Page, GatewayError>, replace: bool) -> FetchOutcome {
        let mut outcome = FetchOutcome::Stale;
        self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            state.is_fetching = false;

            match result {
                Ok(page) => {
                    if replace {
                        state.pages.clear();
                        state.exhausted = false;
                    }
                    append_page(state, page, replace);
                    state.status = FetchStatus::Success;
                    state.error = None;
                    outcome = FetchOutcome::Applied;
                }
                Err(err) => {
                    warn!(epoch, error = %err, "Product fetch failed");
                    state.status = FetchStatus::Error;
                    state.error = Some(err.user_message());
                    outcome = FetchOutcome::Failed(err);
                }
            }
            true
        });

        if matches!(outcome, FetchOutcome::Stale) {
            warn!(epoch, "Discarding stale product page");
        }
        outcome
    }
}

/// Append `page`, keeping the accumulated count within the first page's total.
fn append_page(state: &mut CatalogState, mut page: Page, first: bool) {
    let total = state
        .total_records()
        .unwrap_or(page.total_records);
    let room = usize::try_from(total)
        .unwrap_or(usize::MAX)
        .saturating_sub(state.accumulated_count());

    if page.products.len() > room {
        warn!(
            received = page.products.len(),
            room, "Page overruns total_records, truncating"
        );
        page.products.truncate(room);
    }

    if page.products.is_empty() {
        state.exhausted = true;
        if !first {
            return;
        }
    }
    state.pages.push(page);
}
