//! Integration tests for Shopfront.
//!
//! Provides [`FakeCommerceApi`], an in-process `axum` server speaking the
//! commerce API's JSON envelope format, so the real HTTP gateway and the
//! controllers can be exercised end to end without a live store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Catalog
//!
//! - Products 1 to 25, priced `id * 2`, brand 7 on even ids, brand 8 on odd
//! - Product 13 is out of stock
//! - Product 5 has two variants: 501 (`500g`) and 502 (`1kg`, out of stock)
//! - Resource 999 answers after [`SLOW_RESPONSE`]
//! - Filter slug `busy` is rate limited

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shopfront_client::config::{ClientConfig, CommerceApiConfig};
use url::Url;

/// Session token the fake expects.
pub const SESSION_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.c2Vzc2lvbg.c2lnbmF0dXJl";

/// Delay of the deliberately slow listing (resource 999).
pub const SLOW_RESPONSE: Duration = Duration::from_secs(5);

const PRODUCT_COUNT: i64 = 25;
const OUT_OF_STOCK_PRODUCT: i64 = 13;
const VARIANT_PRODUCT: i64 = 5;
const SLOW_RESOURCE: &str = "999";

/// What the fake has seen and what it currently holds.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Raw query strings of `/products` calls, in order.
    pub product_queries: Vec<String>,
    /// `(slug, type)` of `/filters` calls.
    pub filter_queries: Vec<(String, String)>,
    /// Bodies of `/cart/add` calls.
    pub add_bodies: Vec<Value>,
    /// `Authorization` headers seen.
    pub authorizations: Vec<String>,
    /// Lines currently in the cart.
    pub cart_lines: Vec<Value>,
    /// When set, `/cart` answers `status: false` with this message.
    pub cart_rejection: Option<String>,
}

/// A running fake commerce API.
pub struct FakeCommerceApi {
    base_url: Url,
    state: Arc<Mutex<Recorded>>,
}

impl FakeCommerceApi {
    /// Start the fake on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(Mutex::new(Recorded::default()));

        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/{id}", get(product_detail))
            .route("/api/filters", get(filters))
            .route("/api/cart", get(get_cart))
            .route("/api/cart/add", post(add_to_cart))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Ok(Self { base_url, state })
    }

    /// API root of the fake.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at the fake, signed in.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.base_url.clone());
        config.api.api_token = Some(SESSION_TOKEN.to_string().into());
        config.cart_preview_delay = Duration::from_millis(10);
        config
    }

    /// API configuration pointing at the fake, signed in.
    #[must_use]
    pub fn api_config(&self) -> CommerceApiConfig {
        self.config().api
    }

    /// Inspect or change what the fake holds.
    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        lock(&self.state)
    }
}

type Shared = Arc<Mutex<Recorded>>;

fn lock(state: &Shared) -> MutexGuard<'_, Recorded> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record_auth(state: &Shared, headers: &HeaderMap) {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        lock(state).authorizations.push(value.to_string());
    }
}

fn rejected(message: &str) -> Response {
    Json(json!({ "status": false, "message": message })).into_response()
}

const fn brand_of(id: i64) -> i64 {
    if id % 2 == 0 { 7 } else { 8 }
}

fn price_of(id: i64) -> i64 {
    id * 2
}

fn product_json(id: i64) -> Value {
    let mut product = json!({
        "id": id,
        "name": format!("Product {id}"),
        // Prices arrive as strings, sometimes numbers
        "price": if id % 3 == 0 {
            json!(price_of(id))
        } else {
            json!(price_of(id).to_string())
        },
        "categories": [{ "id": 1, "name": "Dates" }],
        "product_stock_status": if id == OUT_OF_STOCK_PRODUCT { "outofstock" } else { "instock" },
    });
    if id % 2 == 0 {
        product["images"] = json!([{ "src": format!("https://cdn.test/{id}.jpg") }]);
    } else {
        product["image"] = json!(format!("https://cdn.test/{id}-main.jpg"));
    }
    product
}

async fn list_products(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    RawQuery(raw): RawQuery,
) -> Response {
    record_auth(&state, &headers);
    lock(&state).product_queries.push(raw.unwrap_or_default());

    let param = |key: &str| params.get(key).map(String::as_str);

    if param("id") == Some(SLOW_RESOURCE) {
        tokio::time::sleep(SLOW_RESPONSE).await;
    }

    let mut ids: Vec<i64> = (1..=PRODUCT_COUNT)
        .filter(|&id| {
            param("pa_brand")
                .and_then(|b| b.parse::<i64>().ok())
                .is_none_or(|brand| brand_of(id) == brand)
        })
        .filter(|&id| {
            let min = param("min_price").and_then(|p| p.parse::<i64>().ok());
            let max = param("max_price").and_then(|p| p.parse::<i64>().ok());
            min.is_none_or(|min| price_of(id) >= min) && max.is_none_or(|max| price_of(id) <= max)
        })
        .collect();

    match (param("orderby"), param("order")) {
        (Some("price"), Some("asc")) | (Some("ID"), Some("asc")) => {}
        _ => ids.reverse(),
    }

    let page = param("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = param("per_page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(10);
    let data: Vec<Value> = ids
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|&id| product_json(id))
        .collect();

    Json(json!({
        "status": true,
        "data": data,
        // Counts arrive as strings
        "total_records": ids.len().to_string(),
    }))
    .into_response()
}

async fn product_detail(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    record_auth(&state, &headers);

    if !(1..=PRODUCT_COUNT).contains(&id) {
        return rejected("Product not found");
    }
    if id != VARIANT_PRODUCT {
        return Json(json!({
            "status": true,
            "data": { "product_variant": [], "product_variant_data": null },
        }))
        .into_response();
    }

    Json(json!({
        "status": true,
        "data": {
            "product_variant": [
                { "variation_id": 501, "attribute_value": "500g", "price": "20.00", "stock_status": "instock" },
                { "variation_id": 502, "attribute_value": "1kg", "price": "36.50", "stock_status": "outofstock" },
            ],
            "product_variant_data": { "name": "Weight" },
        },
    }))
    .into_response()
}

async fn filters(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    record_auth(&state, &headers);
    let slug = params.get("slug").cloned().unwrap_or_default();
    let kind = params.get("type").cloned().unwrap_or_default();
    lock(&state).filter_queries.push((slug.clone(), kind.clone()));

    if slug == "busy" {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "7")],
            "slow down",
        )
            .into_response();
    }

    let brands = if kind == "brand" {
        json!([])
    } else {
        json!([
            { "term_id": 7, "name": "Bateel", "slug": "bateel" },
            { "term_id": 8, "name": "Al Barakah", "slug": "al-barakah" },
        ])
    };

    Json(json!({
        "status": true,
        "brands": brands,
        "types": [{ "term_id": 21, "name": "Stuffed", "slug": "stuffed" }],
        "weights": [{ "term_id": 31, "name": "1kg", "slug": "1kg" }],
        "price": { "min": "2", "max": "50" },
    }))
    .into_response()
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record_auth(&state, &headers);
    let recorded = lock(&state);

    if let Some(message) = &recorded.cart_rejection {
        return rejected(message);
    }
    Json(json!({ "status": true, "items": recorded.cart_lines })).into_response()
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&state, &headers);
    let mut recorded = lock(&state);
    recorded.add_bodies.push(body.clone());

    let product_id = body["product_id"].as_i64().unwrap_or_default();
    let variation = body["variation_id"].as_str().unwrap_or_default().to_string();

    if product_id == OUT_OF_STOCK_PRODUCT || variation == "502" {
        return rejected("<p>Sorry, this item is out&nbsp;of&nbsp;stock.</p>");
    }
    if product_id == VARIANT_PRODUCT && variation.is_empty() {
        return rejected("Please choose product options.");
    }

    let unit = if variation == "501" {
        json!("20.00")
    } else {
        json!(price_of(product_id).to_string())
    };
    recorded.cart_lines.push(json!({
        "key": format!("{product_id}-{variation}"),
        "product_id": product_id,
        "variation_id": if variation.is_empty() { json!(0) } else { json!(variation) },
        "name": format!("Product {product_id}"),
        "quantity": "1",
        "price": unit,
    }));

    Json(json!({ "status": true, "message": "Added" })).into_response()
}
