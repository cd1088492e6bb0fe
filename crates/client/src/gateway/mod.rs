//! Remote catalog and cart gateways.
//!
//! # Architecture
//!
//! - The controllers only see the [`CatalogGateway`] and [`CartGateway`] traits
//! - [`CommerceClient`] implements both against the JSON-over-HTTP commerce API
//! - The commerce API is source of truth - nothing is persisted locally
//! - Filter metadata is cached in memory via `moka`; products and carts are not
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::gateway::{CartGateway, CommerceClient};
//!
//! let client = CommerceClient::new(&config.api)?;
//!
//! let detail = client.get_product_detail(ProductId::new(42)).await?;
//! if detail.variants.is_empty() {
//!     client.add_to_cart(&AddToCartRequest::single(detail.product_id, None)).await?;
//! }
//! ```

mod client;
mod conversions;
mod wire;

use std::future::Future;

use shopfront_core::{
    AddToCartRequest, CartSnapshot, CatalogQuery, FilterOptions, Page, PageCursor, ProductDetail,
    ProductId,
};
use thiserror::Error;

pub use client::CommerceClient;

/// Shown when the API gives no usable explanation.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API answered with `status: false`. Carries the API's message,
    /// already stripped to plain text.
    #[error("{0}")]
    Rejected(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GatewayError {
    /// Text to show the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::Api { message, .. } => sanitize_message(message),
            Self::Timeout => "The request timed out. Please try again.".to_string(),
            Self::RateLimited(secs) => {
                format!("Too many requests. Please try again in {secs} seconds.")
            }
            Self::Http(_) | Self::Parse(_) | Self::InvalidUrl(_) => {
                FALLBACK_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Whether the failure came from the client-side timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Strip markup from an API message so it can be shown as plain text.
///
/// Removes HTML tags, decodes the common entities and collapses whitespace.
/// Falls back to [`FALLBACK_ERROR_MESSAGE`] when nothing readable is left.
#[must_use]
pub fn sanitize_message(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        FALLBACK_ERROR_MESSAGE.to_string()
    } else {
        collapsed
    }
}

/// Product listing and filter metadata queries.
pub trait CatalogGateway: Send + Sync {
    /// Fetch one page of products for a query.
    fn fetch_products(
        &self,
        query: &CatalogQuery,
        cursor: PageCursor,
    ) -> impl Future<Output = Result<Page, GatewayError>> + Send;

    /// Fetch the filter options for a resource slug.
    ///
    /// `brand_only` narrows the metadata for brand listings.
    fn fetch_filter_metadata(
        &self,
        slug: &str,
        brand_only: bool,
    ) -> impl Future<Output = Result<FilterOptions, GatewayError>> + Send;
}

/// Cart reads and mutations, plus the product detail the add flow needs.
pub trait CartGateway: Send + Sync {
    /// Fetch the current cart.
    fn get_cart(&self) -> impl Future<Output = Result<CartSnapshot, GatewayError>> + Send;

    /// Fetch a product's variant metadata.
    fn get_product_detail(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<ProductDetail, GatewayError>> + Send;

    /// Add an item to the cart.
    fn add_to_cart(
        &self,
        request: &AddToCartRequest,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_message_verbatim() {
        let err = GatewayError::Rejected("Session expired".to_string());
        assert_eq!(err.to_string(), "Session expired");
        assert_eq!(err.user_message(), "Session expired");
    }

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(
            sanitize_message("<strong>Error:</strong> Sorry, &quot;Dates&quot; is out&nbsp;of stock."),
            "Error: Sorry, \"Dates\" is out of stock."
        );
    }

    #[test]
    fn test_rejected_message_decoded_once() {
        let message = sanitize_message("<p>Use &amp;lt;b&amp;gt; for bold</p>");
        assert_eq!(message, "Use &lt;b&gt; for bold");

        let err = GatewayError::Rejected(message);
        assert_eq!(err.user_message(), "Use &lt;b&gt; for bold");
        assert_eq!(err.to_string(), "Use &lt;b&gt; for bold");
    }

    #[test]
    fn test_sanitize_falls_back_when_empty() {
        assert_eq!(sanitize_message("<br/>  "), FALLBACK_ERROR_MESSAGE);
        assert_eq!(sanitize_message(""), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_rate_limited_error() {
        let err = GatewayError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_api_error_display() {
        let err = GatewayError::Api {
            status: 502,
            message: "Bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - Bad gateway");
        assert_eq!(err.user_message(), "Bad gateway");
    }
}
