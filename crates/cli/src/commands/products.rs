//! Product listing command.

use rust_decimal::Decimal;
use shopfront_client::ProductListing;
use shopfront_client::catalog::{FetchOutcome, QueryState, SortOption};
use shopfront_client::config::ClientConfig;
use shopfront_core::{
    FilterSelection, PriceRange, ProductSummary, ResourceId, ResourceRef, ResourceType, Term,
    TermId,
};
use tracing::info;

use super::{CliError, client};

/// Arguments of `shopfront products`.
pub struct ProductsArgs {
    pub resource_id: i64,
    pub slug: String,
    pub kind: ResourceType,
    pub brand: Option<i64>,
    pub price: Option<(Decimal, Decimal)>,
    pub type_term: Option<i64>,
    pub weight: Option<i64>,
    pub sort: SortOption,
    pub pages: u32,
}

impl ProductsArgs {
    fn selection(&self) -> FilterSelection {
        let term = |id: i64| Term::with_id(TermId::new(id));
        FilterSelection {
            brand: self.brand.map(term),
            price_range: self.price.map(|(min, max)| PriceRange::new(min, max)),
            type_term: self.type_term.map(term),
            weight_term: self.weight.map(term),
        }
    }
}

/// List up to `args.pages` pages of a resource's products.
///
/// # Errors
///
/// Returns an error if the client cannot be built or a page fetch fails.
#[allow(clippy::print_stdout)]
pub async fn list(config: &ClientConfig, args: ProductsArgs) -> Result<(), CliError> {
    let mut state = QueryState::new(ResourceRef {
        id: ResourceId::new(args.resource_id),
        kind: args.kind,
        slug: args.slug.clone(),
    });
    state.set_filters(&args.selection());
    state.set_sort(args.sort.order());

    let listing = ProductListing::with_state(client(config)?, state);

    check(listing.open().await)?;
    for _ in 1..args.pages {
        if !listing.state().has_next_page() {
            break;
        }
        check(listing.fetch_next_page().await)?;
    }

    let products = listing.products();
    info!(
        shown = products.len(),
        total = ?listing.total_records(),
        "Fetched products"
    );

    for product in &products {
        println!("{}", format_row(product));
    }
    println!(
        "{} of {} products",
        products.len(),
        listing.total_records().unwrap_or_default()
    );
    Ok(())
}

fn check(outcome: FetchOutcome) -> Result<(), CliError> {
    match outcome {
        FetchOutcome::Failed(err) => Err(err.into()),
        FetchOutcome::Applied | FetchOutcome::Skipped | FetchOutcome::Stale => Ok(()),
    }
}

fn format_row(product: &ProductSummary) -> String {
    let price = product
        .price
        .map_or_else(|| "-".to_string(), |price| price.to_string());
    let stock = if product.can_add_to_cart() {
        ""
    } else {
        " [out of stock]"
    };
    format!(
        "{:>8}  {:<40}  {:>12}  {}{stock}",
        product.id,
        product.name,
        price,
        product.categories_label()
    )
}
