//! JSON-over-HTTP implementation of the gateway traits.

use std::sync::Arc;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shopfront_core::{
    AddToCartRequest, CartSnapshot, CatalogQuery, CurrencyCode, FilterOptions, Page, PageCursor,
    ProductDetail, ProductId,
};
use tracing::{debug, instrument};
use url::Url;

use super::conversions::{convert_cart, convert_filter_options, convert_page, convert_product_detail};
use super::wire::{CartBody, Empty, Envelope, FiltersBody, ProductDetailBody, ProductsBody};
use super::{CartGateway, CatalogGateway, GatewayError, sanitize_message};
use crate::config::CommerceApiConfig;

/// Client for the commerce API.
///
/// Cheap to clone; clones share the HTTP connection pool and the filter
/// metadata cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<SecretString>,
    page_size: u32,
    currency: CurrencyCode,
    filter_cache: Cache<String, FilterOptions>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CommerceApiConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let filter_cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(config.filter_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(CommerceClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                api_token: config.api_token.clone(),
                page_size: config.page_size,
                currency: config.currency,
                filter_cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        Ok(Url::parse(&format!("{}/{path}", self.inner.base_url))?)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and unwrap the response envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        let response_text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: envelope_message(&response_text)
                    .unwrap_or_else(|| response_text.chars().take(200).collect()),
            });
        }

        let envelope: Envelope<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse commerce API response"
                );
                return Err(GatewayError::Parse(e));
            }
        };

        if !envelope.status {
            let message = sanitize_message(envelope.message.as_deref().unwrap_or_default());
            debug!(message = %message, "Commerce API rejected request");
            return Err(GatewayError::Rejected(message));
        }

        Ok(envelope.body)
    }
}

/// Client-side timeouts get their own variant so callers can tell them apart.
fn map_transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Http(error)
    }
}

/// Pull `message` out of an error body, if it is an envelope at all.
fn envelope_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<Empty>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
        .filter(|message| !message.trim().is_empty())
}

fn products_url(
    mut url: Url,
    query: &CatalogQuery,
    cursor: PageCursor,
    page_size: u32,
) -> String {
    url.query_pairs_mut()
        .append_pair("id", &query.resource_id.to_string())
        .append_pair("type", query.resource_type.as_str())
        .append_pair("orderby", query.sort_key.as_str())
        .append_pair("order", query.sort_direction.as_str())
        .append_pair("page", &cursor.to_string())
        .append_pair("per_page", &page_size.to_string());

    // The filter expression is already an encoded `&key=value` fragment.
    let mut url = String::from(url);
    url.push_str(query.filter_expression.as_str());
    url
}

impl CatalogGateway for CommerceClient {
    #[instrument(skip(self, query), fields(resource_id = %query.resource_id, page = %cursor))]
    async fn fetch_products(
        &self,
        query: &CatalogQuery,
        cursor: PageCursor,
    ) -> Result<Page, GatewayError> {
        let url = products_url(self.endpoint("products")?, query, cursor, self.inner.page_size);
        let body: ProductsBody = self.execute(self.inner.client.get(url)).await?;

        let page = convert_page(body, cursor, self.inner.currency);
        debug!(
            count = page.products.len(),
            total_records = page.total_records,
            "Fetched product page"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn fetch_filter_metadata(
        &self,
        slug: &str,
        brand_only: bool,
    ) -> Result<FilterOptions, GatewayError> {
        let cache_key = format!("filters:{slug}:{brand_only}");

        if let Some(options) = self.inner.filter_cache.get(&cache_key).await {
            debug!("Cache hit for filter metadata");
            return Ok(options);
        }

        let mut url = self.endpoint("filters")?;
        url.query_pairs_mut()
            .append_pair("slug", slug)
            .append_pair("type", if brand_only { "brand" } else { "" });

        let body: FiltersBody = self.execute(self.inner.client.get(url)).await?;
        let options = convert_filter_options(body);

        self.inner
            .filter_cache
            .insert(cache_key, options.clone())
            .await;

        Ok(options)
    }
}

impl CartGateway for CommerceClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<CartSnapshot, GatewayError> {
        let url = self.endpoint("cart")?;
        let body: CartBody = self.execute(self.inner.client.get(url)).await?;

        let snapshot = convert_cart(body, self.inner.currency);
        debug!(lines = snapshot.items.len(), "Fetched cart");
        Ok(snapshot)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn get_product_detail(&self, product_id: ProductId) -> Result<ProductDetail, GatewayError> {
        let url = self.endpoint(&format!("products/{product_id}"))?;
        let body: ProductDetailBody = self.execute(self.inner.client.get(url)).await?;

        Ok(convert_product_detail(product_id, body.data, self.inner.currency))
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<(), GatewayError> {
        let url = self.endpoint("cart/add")?;
        let body = serde_json::to_vec(request)?;
        let _: Empty = self
            .execute(
                self.inner
                    .client
                    .post(url)
                    .header("Content-Type", "application/json")
                    .body(body),
            )
            .await?;

        debug!("Added to cart");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use shopfront_core::{
        FilterExpression, FilterSelection, PriceRange, ResourceId, ResourceRef, ResourceType,
        SortDirection, SortOrder, Term, TermId,
    };

    use super::*;

    fn client() -> CommerceClient {
        let config = CommerceApiConfig::new(Url::parse("https://shop.test/api/v1/").unwrap());
        CommerceClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_dropping_path() {
        let url = client().endpoint("products/42").unwrap();
        assert_eq!(url.as_str(), "https://shop.test/api/v1/products/42");
    }

    #[test]
    fn test_products_url_appends_filter_fragment() {
        let client = client();
        let resource = ResourceRef {
            id: ResourceId::new(12),
            kind: ResourceType::Brand,
            slug: "bateel".to_string(),
        };
        let filter = FilterExpression::encode(&FilterSelection {
            brand: Some(Term::with_id(TermId::new(7))),
            price_range: Some(PriceRange::new(Decimal::from(10), Decimal::from(50))),
            ..FilterSelection::default()
        });
        let query = CatalogQuery::derive(
            &resource,
            &filter,
            &SortOrder::new("price", SortDirection::Asc),
        );

        let url = products_url(
            client.endpoint("products").unwrap(),
            &query,
            PageCursor::new(3),
            10,
        );
        assert_eq!(
            url,
            "https://shop.test/api/v1/products?id=12&type=brand&orderby=price&order=asc&page=3&per_page=10&pa_brand=7&min_price=10&max_price=50"
        );
    }

    #[test]
    fn test_envelope_message_from_error_body() {
        assert_eq!(
            envelope_message(r#"{"status":false,"message":"Nonce invalid"}"#).as_deref(),
            Some("Nonce invalid")
        );
        assert_eq!(envelope_message("<html>Bad Gateway</html>"), None);
    }
}
