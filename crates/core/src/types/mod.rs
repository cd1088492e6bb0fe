//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod filter;
pub mod id;
pub mod price;
pub mod status;
pub mod variant;

pub use cart::{AddToCartRequest, CartLineItem, CartSnapshot, CartStatus, DEFAULT_ADD_QUANTITY};
pub use catalog::{
    CatalogQuery, Category, Page, PageCursor, ProductSummary, ResourceRef, ResourceType,
    SortDirection, SortKey, SortOrder,
};
pub use filter::{FilterExpression, FilterOptions, FilterSelection, PriceBounds, PriceRange, Term};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use variant::{ProductDetail, Variant, VariantSet};
