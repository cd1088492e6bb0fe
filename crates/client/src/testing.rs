//! Scripted gateways for controller tests.
//!
//! Each operation is backed by a [`Script`]: queued results are returned
//! immediately, otherwise the call parks until the test resolves it. Parked
//! calls can be resolved in any order to simulate overlapping requests.

use std::collections::VecDeque;
use std::sync::Mutex;

use rust_decimal::Decimal;
use shopfront_core::{
    AddToCartRequest, CartLineItem, CartSnapshot, CatalogQuery, Category, CategoryId,
    CurrencyCode, FilterOptions, Page, PageCursor, Price, ProductDetail, ProductId,
    ProductSummary, StockStatus, Variant, VariantSet, VariationId,
};
use tokio::sync::oneshot;

use crate::gateway::{CartGateway, CatalogGateway, GatewayError};

type Reply<T> = Result<T, GatewayError>;

/// One scripted gateway operation.
pub struct Script<A, T> {
    ready: Mutex<VecDeque<Reply<T>>>,
    pending: Mutex<Vec<Option<oneshot::Sender<Reply<T>>>>>,
    calls: Mutex<Vec<A>>,
}

impl<A, T> Default for Script<A, T> {
    fn default() -> Self {
        Self {
            ready: Mutex::new(VecDeque::new()),
            pending: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
impl<A: Clone, T> Script<A, T> {
    /// Queue a reply for the next call.
    pub fn push(&self, reply: Reply<T>) {
        self.ready.lock().unwrap().push_back(reply);
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Arguments of every call so far.
    pub fn calls(&self) -> Vec<A> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls ever parked waiting for a reply.
    pub fn parked_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Yield until at least `n` calls have parked.
    pub async fn wait_for_parked(&self, n: usize) {
        while self.parked_count() < n {
            tokio::task::yield_now().await;
        }
    }

    /// Resolve the `index`-th parked call.
    pub fn resolve(&self, index: usize, reply: Reply<T>) {
        let sender = self.pending.lock().unwrap()[index].take().unwrap();
        let _ = sender.send(reply);
    }

    async fn call(&self, args: A) -> Reply<T> {
        self.calls.lock().unwrap().push(args);

        let receiver = {
            if let Some(reply) = self.ready.lock().unwrap().pop_front() {
                return reply;
            }
            let (sender, receiver) = oneshot::channel();
            self.pending.lock().unwrap().push(Some(sender));
            receiver
        };

        receiver.await.unwrap_or(Err(GatewayError::Timeout))
    }
}

/// Scripted catalog gateway.
#[derive(Default)]
pub struct FakeCatalog {
    pub products: Script<(CatalogQuery, PageCursor), Page>,
    pub filters: Script<(String, bool), FilterOptions>,
}

impl CatalogGateway for FakeCatalog {
    async fn fetch_products(&self, query: &CatalogQuery, cursor: PageCursor) -> Reply<Page> {
        self.products.call((query.clone(), cursor)).await
    }

    async fn fetch_filter_metadata(&self, slug: &str, brand_only: bool) -> Reply<FilterOptions> {
        self.filters.call((slug.to_string(), brand_only)).await
    }
}

/// Scripted cart gateway.
#[derive(Default)]
pub struct FakeCart {
    pub cart: Script<(), CartSnapshot>,
    pub detail: Script<ProductId, ProductDetail>,
    pub add: Script<AddToCartRequest, ()>,
}

impl CartGateway for FakeCart {
    async fn get_cart(&self) -> Reply<CartSnapshot> {
        self.cart.call(()).await
    }

    async fn get_product_detail(&self, product_id: ProductId) -> Reply<ProductDetail> {
        self.detail.call(product_id).await
    }

    async fn add_to_cart(&self, request: &AddToCartRequest) -> Reply<()> {
        self.add.call(request.clone()).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product(id: i64) -> ProductSummary {
    ProductSummary {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        price: Some(Price::new(Decimal::from(id), CurrencyCode::AED)),
        image_ref: None,
        categories: vec![Category {
            id: CategoryId::new(1),
            name: "Dates".to_string(),
        }],
        stock_status: StockStatus::InStock,
    }
}

/// A page holding products `ids`, reporting `total` records.
pub fn page(cursor: u32, ids: std::ops::Range<i64>, total: u64) -> Page {
    Page {
        products: ids.map(product).collect(),
        total_records: total,
        page_cursor: PageCursor::new(cursor),
    }
}

pub fn detail(product_id: i64, variation_ids: &[i64]) -> ProductDetail {
    ProductDetail {
        product_id: ProductId::new(product_id),
        variants: VariantSet {
            attribute_label: if variation_ids.is_empty() {
                String::new()
            } else {
                "Weight".to_string()
            },
            options: variation_ids
                .iter()
                .map(|&id| Variant {
                    variation_id: VariationId::new(id),
                    label: format!("{id}g"),
                    price: None,
                    stock_status: StockStatus::InStock,
                })
                .collect(),
        },
    }
}

pub fn cart(lines: &[(i64, u32)]) -> CartSnapshot {
    CartSnapshot::from_items(
        lines
            .iter()
            .map(|&(product_id, quantity)| CartLineItem {
                key: format!("line-{product_id}"),
                product_id: ProductId::new(product_id),
                variation_id: None,
                name: format!("Product {product_id}"),
                quantity,
                unit_price: None,
                line_total: None,
                image_ref: None,
            })
            .collect(),
    )
}
