//! Catalog browsing commands.

use clap::{Args, Subcommand};
use lumina_core::{Price, ProductId};
use lumina_storefront::catalog::PageCursor;
use lumina_storefront::error::AppError;
use lumina_storefront::filter::{SortBy, available_brands};
use lumina_storefront::state::Storefront;
use rust_decimal::Decimal;
use tracing::info;

use super::product_line;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// Newest products, one page at a time
    List {
        /// Cursor printed at the end of the previous page
        #[arg(long)]
        after: Option<String>,
    },
    /// One product in detail
    Show { id: String },
    /// Featured products
    Featured {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Recommended products
    Recommended {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Search by name prefix and keywords
    Search { key: String },
}

#[derive(Args)]
pub struct ShopArgs {
    /// Lowest price shown
    #[arg(long)]
    min: Option<Decimal>,
    /// Highest price shown
    #[arg(long)]
    max: Option<Decimal>,
    /// `name`, `price-asc`, `price-desc` or `date`
    #[arg(long, default_value = "date")]
    sort: String,
    /// Only this brand
    #[arg(long)]
    brand: Option<String>,
    /// Cursor printed at the end of the previous page
    #[arg(long)]
    after: Option<String>,
}

fn parse_cursor(after: Option<&str>) -> Result<Option<PageCursor>, AppError> {
    after
        .map(str::parse::<PageCursor>)
        .transpose()
        .map_err(AppError::from)
}

fn price_arg(value: Decimal, flag: &str) -> Result<Price, AppError> {
    Price::new(value).map_err(|e| AppError::Internal(format!("--{flag}: {e}")))
}

/// Run a `products` subcommand.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn run(shop: &Storefront, action: ProductsAction) -> Result<(), AppError> {
    let catalog = shop.catalog();
    match action {
        ProductsAction::List { after } => {
            let cursor = parse_cursor(after.as_deref())?;
            let page = catalog.list_products(cursor.as_ref()).await?;
            for product in &page.products {
                info!("{}", product_line(product));
            }
            info!(
                "Showing {} of {} products",
                page.products.len(),
                page.total
            );
            if let Some(next) = page.next_cursor {
                info!("More: --after {next}");
            }
        }
        ProductsAction::Show { id } => {
            let product = catalog.get_product(&ProductId::new(id)).await?;
            info!("{}", product_line(&product));
            info!("  Category: {}", product.category);
            info!("  Colors: {}", product.available_colors.join(", "));
            info!("  Sizes: {}", product.available_sizes.join(", "));
            info!("  In cart: {}", shop.cart.quantity_in_cart(&product.id));
            if !product.description.is_empty() {
                info!("  {}", product.description);
            }
        }
        ProductsAction::Featured { limit } => {
            let limit = limit.unwrap_or_else(|| catalog.highlight_limit());
            for product in catalog.featured_products(limit).await? {
                info!("{}", product_line(&product));
            }
        }
        ProductsAction::Recommended { limit } => {
            let limit = limit.unwrap_or_else(|| catalog.highlight_limit());
            for product in catalog.recommended_products(limit).await? {
                info!("{}", product_line(&product));
            }
        }
        ProductsAction::Search { key } => {
            let ticket = catalog.guard().begin("search");
            let results = catalog.search_products(&key).await?;
            let Some(results) = ticket.accept(results) else {
                return Ok(());
            };
            if results.is_empty() {
                info!("No products found for \"{}\"", key.trim());
            }
            for product in &results {
                info!("{}", product_line(product));
            }
        }
    }
    Ok(())
}

/// Run `shop`: one listing page with the filters applied.
///
/// # Errors
///
/// Returns an error if the catalog request fails or a price is negative.
pub async fn shop(shop: &mut Storefront, args: ShopArgs) -> Result<(), AppError> {
    let cursor = parse_cursor(args.after.as_deref())?;
    let defaults = shop.config().filters;
    let min = args.min.map(|v| price_arg(v, "min")).transpose()?;
    let max = args.max.map(|v| price_arg(v, "max")).transpose()?;

    shop.filters.set_price_range(
        min.unwrap_or(defaults.min_price),
        max.unwrap_or(defaults.max_price),
    );
    shop.filters.set_sort_by(SortBy::parse_lenient(&args.sort));
    shop.filters.set_brand(args.brand);

    let page = shop.catalog().list_products(cursor.as_ref()).await?;
    let visible = shop.filters.apply(&page.products);

    info!("Brands: {}", available_brands(&page.products).join(", "));
    for product in &visible {
        info!("{}", product_line(product));
    }
    let state = shop.filters.state();
    info!(
        "Showing {} of {} on this page ({} to {}, sorted by {})",
        visible.len(),
        page.products.len(),
        state.min_price,
        state.max_price,
        state.sort_by
    );
    if let Some(next) = page.next_cursor {
        info!("More: --after {next}");
    }
    Ok(())
}
