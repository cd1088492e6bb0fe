//! CLI subcommands.

pub mod cart;
pub mod filters;
pub mod products;

use std::sync::Arc;

use shopfront_client::AddToCartError;
use shopfront_client::config::{ClientConfig, ConfigError};
use shopfront_client::gateway::{CommerceClient, GatewayError};
use shopfront_core::{ProductId, VariationId};
use thiserror::Error;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{}", .0.user_message())]
    Gateway(#[from] GatewayError),

    #[error("{}", .0.user_message())]
    AddToCart(#[from] AddToCartError),

    #[error("Variation {variation_id} of product {product_id} is out of stock")]
    OutOfStock {
        product_id: ProductId,
        variation_id: VariationId,
    },
}

/// Build the shared API client.
fn client(config: &ClientConfig) -> Result<Arc<CommerceClient>, CliError> {
    Ok(Arc::new(CommerceClient::new(&config.api)?))
}
