//! Shopfront Core - Shared catalog and cart types.
//!
//! This crate provides the domain types used across all Shopfront components:
//! - `client` - Catalog and cart orchestration engine
//! - `cli` - Command-line surface driving the engine
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, statuses, catalog, filter and cart types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
