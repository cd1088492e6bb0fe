//! Cart commands.

use std::sync::Arc;
use std::time::Duration;

use shopfront_client::cart::{
    AddOutcome, AddToCartController, CartSyncController, RefreshOutcome, SharedCartCounter,
};
use shopfront_client::config::ClientConfig;
use shopfront_core::{CartSnapshot, ProductId, VariantSet, VariationId};
use tracing::warn;

use super::{CliError, client};

/// Run the add-to-cart flow for a product.
///
/// Products with variants need `variant`; without it the options are listed
/// and nothing is added.
///
/// # Errors
///
/// Returns an error if the flow fails or the chosen variant is out of stock.
#[allow(clippy::print_stdout)]
pub async fn add(
    config: &ClientConfig,
    product_id: ProductId,
    variant: Option<VariationId>,
) -> Result<(), CliError> {
    let client = client(config)?;
    let counter = SharedCartCounter::new(0);
    let sync = CartSyncController::new(Arc::clone(&client), config.cart_preview_delay);
    let flow = AddToCartController::new(client, counter.clone(), sync.clone());

    let mut outcome = flow.request_add(product_id).await?;

    if let AddOutcome::SelectionRequired(variants) = &outcome {
        let Some(variation_id) = variant else {
            print_variants(variants);
            flow.cancel_variant_selection();
            return Ok(());
        };
        if variants
            .find(variation_id)
            .is_some_and(|v| !v.stock_status.is_purchasable())
        {
            flow.cancel_variant_selection();
            return Err(CliError::OutOfStock {
                product_id,
                variation_id,
            });
        }
        outcome = flow.confirm_variant(variation_id).await?;
    }

    match outcome {
        AddOutcome::Added { refresh, .. } => {
            println!("Added to cart ({} this session)", counter.value());
            match refresh {
                RefreshOutcome::Shown => {
                    if let Some(cart) = sync.cart() {
                        print_cart(&cart);
                    }
                }
                RefreshOutcome::Failed(err) => {
                    warn!(error = %err, "Cart could not be refreshed");
                }
                RefreshOutcome::Stale => {}
            }
        }
        AddOutcome::SelectionRequired(_) | AddOutcome::Superseded => {}
    }
    Ok(())
}

/// Print the current cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be fetched.
pub async fn show(config: &ClientConfig) -> Result<(), CliError> {
    let sync = CartSyncController::new(client(config)?, Duration::ZERO);

    if let RefreshOutcome::Failed(err) = sync.refresh_cart().await {
        return Err(err.into());
    }
    if let Some(cart) = sync.cart() {
        print_cart(&cart);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_variants(variants: &VariantSet) {
    println!("Choose a {} with --variant:", variants.attribute_label);
    for variant in &variants.options {
        let price = variant
            .price
            .map(|price| price.to_string())
            .unwrap_or_default();
        let stock = if variant.stock_status.is_purchasable() {
            ""
        } else {
            " [out of stock]"
        };
        println!(
            "  {:>8}  {:<20}  {price}{stock}",
            variant.variation_id, variant.label
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &CartSnapshot) {
    if !cart.can_checkout() {
        println!("Your cart is empty");
        return;
    }
    for line in &cart.items {
        let total = line
            .line_total
            .map(|price| price.to_string())
            .unwrap_or_default();
        println!("  {:>3} x {:<40}  {total:>12}", line.quantity, line.name);
    }
    let subtotal = cart
        .subtotal()
        .map(|price| price.to_string())
        .unwrap_or_default();
    println!("{} items, subtotal {subtotal}", cart.item_count());
}
