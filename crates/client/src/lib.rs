//! Shopfront client library.
//!
//! The catalog and cart orchestration engine of the Shopfront mobile
//! storefront: paginated, filterable product listings; the add-to-cart flow
//! with variant resolution; and cart synchronization with a shared item
//! counter. All remote calls go through the [`gateway`] traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use shopfront_client::cart::{AddToCartController, CartSyncController, SharedCartCounter};
//! use shopfront_client::config::ClientConfig;
//! use shopfront_client::gateway::CommerceClient;
//!
//! let config = ClientConfig::from_env()?;
//! let client = Arc::new(CommerceClient::new(&config.api)?);
//!
//! let counter = SharedCartCounter::new(0);
//! let cart = CartSyncController::new(Arc::clone(&client), config.cart_preview_delay);
//! let add = AddToCartController::new(client, counter.clone(), cart);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod listing;

#[cfg(test)]
mod testing;

pub use error::AddToCartError;
pub use listing::ProductListing;
