//! Filter metadata command.

use shopfront_client::config::ClientConfig;
use shopfront_client::gateway::CatalogGateway;
use shopfront_core::Term;

use super::{CliError, client};

/// Print the filter options of a resource.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the fetch fails.
#[allow(clippy::print_stdout)]
pub async fn show(config: &ClientConfig, slug: &str, brand_only: bool) -> Result<(), CliError> {
    let options = client(config)?
        .fetch_filter_metadata(slug, brand_only)
        .await?;

    print_terms("Brands", &options.brands);
    print_terms("Types", &options.types);
    print_terms("Weights", &options.weights);
    if let Some(price) = options.price {
        println!("Price: {} - {}", price.min, price.max);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_terms(heading: &str, terms: &[Term]) {
    if terms.is_empty() {
        return;
    }
    println!("{heading}:");
    for term in terms {
        println!("  {:>6}  {}", term.term_id, term.name);
    }
}
