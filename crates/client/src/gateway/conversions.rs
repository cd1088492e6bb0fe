//! Conversions from wire shapes to `shopfront-core` domain types.

use shopfront_core::{
    CartLineItem, CartSnapshot, Category, CategoryId, CurrencyCode, FilterOptions, Page,
    PageCursor, Price, PriceBounds, ProductDetail, ProductId, ProductSummary, StockStatus, Term,
    TermId, Variant, VariantSet, VariationId,
};

use super::wire::{
    CartBody, FiltersBody, ProductsBody, WireCartLine, WireProduct, WireProductDetail, WireTerm,
    WireVariant,
};

fn convert_stock_status(raw: Option<&str>) -> StockStatus {
    match raw {
        Some("outofstock") => StockStatus::OutOfStock,
        _ => StockStatus::InStock,
    }
}

pub fn convert_product(product: WireProduct, currency: CurrencyCode) -> ProductSummary {
    let image_ref = product
        .images
        .into_iter()
        .next()
        .map(|image| image.src)
        .or(product.image)
        .filter(|src| !src.is_empty());

    ProductSummary {
        id: ProductId::new(product.id),
        name: product.name,
        price: product.price.map(|amount| Price::new(amount, currency)),
        image_ref,
        categories: product
            .categories
            .into_iter()
            .map(|c| Category {
                id: CategoryId::new(c.id),
                name: c.name,
            })
            .collect(),
        stock_status: convert_stock_status(product.product_stock_status.as_deref()),
    }
}

pub fn convert_page(body: ProductsBody, cursor: PageCursor, currency: CurrencyCode) -> Page {
    Page {
        products: body
            .data
            .into_iter()
            .map(|p| convert_product(p, currency))
            .collect(),
        total_records: body.total_records,
        page_cursor: cursor,
    }
}

fn convert_term(term: WireTerm) -> Term {
    Term {
        term_id: TermId::new(term.term_id),
        name: term.name,
        slug: term.slug,
    }
}

pub fn convert_filter_options(body: FiltersBody) -> FilterOptions {
    let price = body.price.and_then(|bounds| match (bounds.min, bounds.max) {
        (Some(min), Some(max)) => Some(PriceBounds { min, max }),
        _ => None,
    });

    FilterOptions {
        brands: body.brands.into_iter().map(convert_term).collect(),
        types: body.types.into_iter().map(convert_term).collect(),
        weights: body.weights.into_iter().map(convert_term).collect(),
        price,
    }
}

fn convert_variant(variant: WireVariant, currency: CurrencyCode) -> Variant {
    Variant {
        variation_id: VariationId::new(variant.variation_id),
        label: variant.label,
        price: variant.price.map(|amount| Price::new(amount, currency)),
        stock_status: convert_stock_status(variant.stock_status.as_deref()),
    }
}

pub fn convert_product_detail(
    product_id: ProductId,
    detail: Option<WireProductDetail>,
    currency: CurrencyCode,
) -> ProductDetail {
    let detail = detail.unwrap_or_default();
    ProductDetail {
        product_id,
        variants: VariantSet {
            attribute_label: detail.product_variant_data.name,
            options: detail
                .product_variant
                .into_iter()
                .map(|v| convert_variant(v, currency))
                .collect(),
        },
    }
}

fn convert_cart_line(line: WireCartLine, currency: CurrencyCode) -> CartLineItem {
    let unit_price = line.price.map(|amount| Price::new(amount, currency));
    let line_total = line
        .line_total
        .map(|amount| Price::new(amount, currency))
        .or_else(|| unit_price.map(|price| price.times(line.quantity)));

    CartLineItem {
        key: line.key,
        product_id: ProductId::new(line.product_id),
        variation_id: line.variation_id.map(VariationId::new),
        name: line.name,
        quantity: line.quantity,
        unit_price,
        line_total,
        image_ref: line.image.filter(|src| !src.is_empty()),
    }
}

/// The cart may quote its own currency; unknown codes fall back to `currency`.
pub fn convert_cart(body: CartBody, currency: CurrencyCode) -> CartSnapshot {
    let currency = body
        .currency
        .as_deref()
        .and_then(|code| code.trim().parse::<CurrencyCode>().ok())
        .unwrap_or(currency);
    CartSnapshot::from_items(
        body.items
            .into_iter()
            .map(|line| convert_cart_line(line, currency))
            .collect(),
    )
}
