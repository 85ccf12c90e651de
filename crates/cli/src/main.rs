//! Lumina CLI - drive the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse an offline catalog
//! lumina --catalog fixtures/catalog.yaml products list
//! lumina --catalog fixtures/catalog.yaml shop --brand Salt --sort price-asc
//!
//! # Cart and checkout
//! lumina cart add p-100 --quantity 2 --size M
//! lumina auth sign-in -e ana@example.com -p hunter22
//! lumina checkout shipping --fullname "Ana Cruz" --email ana@example.com \
//!     --address "12 Rizal Ave, Manila" --mobile "0917 123 4567"
//! lumina checkout payment --name "Ana Cruz" --card-number 4111111111111111 \
//!     --expiry 12/29 --ccv 123
//!
//! # Admin
//! lumina admin create -f product.yaml
//! ```
//!
//! # Commands
//!
//! - `products` - Catalog listings, product detail and search
//! - `shop` - Listing with price, brand and sort filters
//! - `cart` - Cart contents and edits
//! - `checkout` - The three checkout steps
//! - `auth` - Sign-in, sign-up and profile
//! - `admin` - Product create/update/delete and dashboard

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lumina_storefront::config::StorefrontConfig;
use lumina_storefront::error::AppError;
use lumina_storefront::state::{Backends, Storefront};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "lumina")]
#[command(author, version, about = "Lumina Boutique storefront CLI")]
struct Cli {
    /// YAML catalog used when no Firebase project is configured
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: commands::products::ProductsAction,
    },
    /// List products with filters applied
    Shop(commands::products::ShopArgs),
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Walk through checkout
    Checkout {
        #[command(subcommand)]
        action: commands::checkout::CheckoutAction,
    },
    /// Sign in, sign up and manage the profile
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Manage products (ADMIN role)
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
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

    // Configuration errors are reported before Sentry exists
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lumina_storefront=info,lumina_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        match e.downcast_ref::<AppError>() {
            Some(app) => {
                app.capture();
                tracing::error!("{}", app.user_message());
            }
            None => tracing::error!("Command failed: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let fixture = match &cli.catalog {
        Some(path) => commands::fixture::load(path).await?,
        None => commands::fixture::Fixture::default(),
    };
    let (products, accounts) = fixture.into_parts();
    let backends = Backends::from_config(&config, products, accounts)?;
    let mut shop = Storefront::new(config, backends);

    match cli.command {
        Commands::Products { action } => commands::products::run(&shop, action).await?,
        Commands::Shop(args) => commands::products::shop(&mut shop, args).await?,
        Commands::Cart { action } => commands::cart::run(&mut shop, action).await?,
        Commands::Checkout { action } => commands::checkout::run(&mut shop, action)?,
        Commands::Auth { action } => commands::auth::run(&mut shop, action).await?,
        Commands::Admin { action } => commands::admin::run(&shop, action).await?,
    }
    Ok(())
}
