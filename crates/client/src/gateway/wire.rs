//! Raw JSON shapes returned by the commerce API.
//!
//! Kept separate from the domain types in `shopfront-core`; see
//! `conversions` for the mapping. Every response is wrapped in an envelope
//! carrying `status` and an optional `message`.

use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Envelope shared by every endpoint. A missing `status` means success.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_status", deserialize_with = "de_status")]
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

const fn default_status() -> bool {
    true
}

/// Body with nothing beyond the envelope (add-to-cart).
#[derive(Debug, Default, Deserialize)]
pub struct Empty {}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductsBody {
    #[serde(default, alias = "products")]
    pub data: Vec<WireProduct>,
    #[serde(default, alias = "totalRecords", deserialize_with = "de_count")]
    pub total_records: u64,
}

#[derive(Debug, Deserialize)]
pub struct WireProduct {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_decimal_opt")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "de_list")]
    pub images: Vec<WireImage>,
    #[serde(default, deserialize_with = "de_list")]
    pub categories: Vec<WireCategory>,
    #[serde(default)]
    pub product_stock_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireImage {
    pub src: String,
}

#[derive(Debug, Deserialize)]
pub struct WireCategory {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Filters
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FiltersBody {
    #[serde(default)]
    pub brands: Vec<WireTerm>,
    #[serde(default)]
    pub types: Vec<WireTerm>,
    #[serde(default)]
    pub weights: Vec<WireTerm>,
    #[serde(default)]
    pub price: Option<WirePriceBounds>,
}

#[derive(Debug, Deserialize)]
pub struct WireTerm {
    pub term_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct WirePriceBounds {
    #[serde(default, deserialize_with = "de_decimal_opt")]
    pub min: Option<Decimal>,
    #[serde(default, deserialize_with = "de_decimal_opt")]
    pub max: Option<Decimal>,
}

// =============================================================================
// Product detail
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductDetailBody {
    #[serde(default)]
    pub data: Option<WireProductDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireProductDetail {
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub product_variant: Vec<WireVariant>,
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub product_variant_data: WireVariantData,
}

#[derive(Debug, Deserialize)]
pub struct WireVariant {
    pub variation_id: i64,
    #[serde(default, alias = "attribute_value", alias = "name")]
    pub label: String,
    #[serde(default, deserialize_with = "de_decimal_opt")]
    pub price: Option<Decimal>,
    #[serde(default, alias = "product_stock_status")]
    pub stock_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireVariantData {
    #[serde(default, alias = "label", alias = "attribute_label")]
    pub name: String,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CartBody {
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub items: Vec<WireCartLine>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireCartLine {
    #[serde(default)]
    pub key: String,
    pub product_id: i64,
    #[serde(default, deserialize_with = "de_id_opt")]
    pub variation_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_quantity", deserialize_with = "de_count_u32")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "de_decimal_opt")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "de_decimal_opt")]
    pub line_total: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

// =============================================================================
// Lenient scalar decoding
// =============================================================================

/// A JSON scalar that may arrive as a number, a string or a bool.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

fn de_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => true,
        Some(Scalar::Bool(b)) => b,
        Some(Scalar::Int(n)) => n != 0,
        Some(Scalar::Float(n)) => n.abs() > f64::EPSILON,
        Some(Scalar::Text(s)) => !matches!(s.trim(), "false" | "0" | "error" | ""),
    })
}

fn de_decimal_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(n)) => Some(Decimal::from(n)),
        Some(Scalar::Float(n)) => Decimal::try_from(n).ok(),
        Some(Scalar::Text(s)) => s.trim().parse::<Decimal>().ok(),
        Some(Scalar::Bool(_)) | None => None,
    })
}

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(n)) => u64::try_from(n).unwrap_or(0),
        Some(Scalar::Text(s)) => s.trim().parse::<u64>().unwrap_or(0),
        Some(Scalar::Float(_) | Scalar::Bool(_)) | None => 0,
    })
}

fn de_count_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    de_count(deserializer).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Variation IDs arrive as `0`, `""` or `null` when there is no variant.
fn de_id_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(n)) if n > 0 => Some(n),
        Some(Scalar::Text(s)) => s.trim().parse::<i64>().ok().filter(|n| *n > 0),
        _ => None,
    })
}

/// Lists arrive as `null`, `false` or another non-array when empty.
fn de_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeList<T> {
        List(Vec<T>),
        Other(IgnoredAny),
    }

    Ok(match MaybeList::<T>::deserialize(deserializer)? {
        MaybeList::List(items) => items,
        MaybeList::Other(_) => Vec::new(),
    })
}

fn de_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
