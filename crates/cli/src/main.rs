//! Shopfront CLI - browse the catalog and drive the cart against a live API.
//!
//! # Usage
//!
//! ```bash
//! # First two pages of a category, cheapest first
//! shopfront products --id 12 --slug dates --sort price-asc --pages 2
//!
//! # Only one brand, between 10 and 50
//! shopfront products --id 12 --slug dates --brand 7 --min-price 10 --max-price 50
//!
//! # Filter options of a brand page
//! shopfront filters --slug bateel --brand-only
//!
//! # Add a product, picking a variant if it has any
//! shopfront add 42 --variant 4201
//!
//! # Show the cart
//! shopfront cart
//! ```
//!
//! # Environment Variables
//!
//! See `shopfront_client::config`. `RUST_LOG` controls log output;
//! `SHOPFRONT_LOG_FORMAT=json` switches logs to JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use shopfront_client::catalog::SortOption;
use shopfront_client::config::ClientConfig;
use shopfront_core::{ProductId, ResourceType, VariationId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront catalog and cart CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products of a category, brand or tag
    Products {
        /// Resource ID
        #[arg(long)]
        id: i64,

        /// Resource slug
        #[arg(long)]
        slug: String,

        /// Resource type (`category`, `brand`, `tag`)
        #[arg(long = "type", default_value = "category")]
        kind: ResourceType,

        /// Brand term ID
        #[arg(long)]
        brand: Option<i64>,

        /// Lowest price (requires --max-price)
        #[arg(long, requires = "max_price")]
        min_price: Option<Decimal>,

        /// Highest price (requires --min-price)
        #[arg(long, requires = "min_price")]
        max_price: Option<Decimal>,

        /// Product type term ID
        #[arg(long)]
        type_term: Option<i64>,

        /// Weight term ID
        #[arg(long)]
        weight: Option<i64>,

        /// Sort (`newest`, `oldest`, `price-asc`, `price-desc`, `name`, `popularity`)
        #[arg(long, default_value = "newest")]
        sort: SortOption,

        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show the filter options of a resource
    Filters {
        /// Resource slug
        #[arg(long)]
        slug: String,

        /// Brand listing filters
        #[arg(long)]
        brand_only: bool,
    },
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: i64,

        /// Variation to add when the product has variants
        #[arg(short, long)]
        variant: Option<i64>,
    },
    /// Show the cart
    Cart,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is needed before tracing for the Sentry DSN
    let config = ClientConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront_client=info,shopfront_cli=info".into());

    // Logs go to stderr so command output stays pipeable
    let json_logs = std::env::var("SHOPFRONT_LOG_FORMAT").is_ok_and(|v| v == "json");
    let json_layer = json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Products {
            id,
            slug,
            kind,
            brand,
            min_price,
            max_price,
            type_term,
            weight,
            sort,
            pages,
        } => {
            let args = commands::products::ProductsArgs {
                resource_id: id,
                slug,
                kind,
                brand,
                price: min_price.zip(max_price),
                type_term,
                weight,
                sort,
                pages,
            };
            commands::products::list(config, args).await?;
        }
        Commands::Filters { slug, brand_only } => {
            commands::filters::show(config, &slug, brand_only).await?;
        }
        Commands::Add {
            product_id,
            variant,
        } => {
            commands::cart::add(
                config,
                ProductId::new(product_id),
                variant.map(VariationId::new),
            )
            .await?;
        }
        Commands::Cart => commands::cart::show(config).await?,
    }
    Ok(())
}
