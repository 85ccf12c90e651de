//! Cart commands.

use clap::Subcommand;
use lumina_core::ProductId;
use lumina_storefront::cart::{CartLine, VariantKey};
use lumina_storefront::error::AppError;
use lumina_storefront::state::Storefront;
use tracing::info;

use super::cart_line;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show cart lines and the total
    Show,
    /// Add a product
    Add {
        id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Color token (defaults to the first listed)
        #[arg(long)]
        color: Option<String>,
        /// Size token (defaults to the first listed)
        #[arg(long)]
        size: Option<String>,
    },
    /// Remove a product, or one variant with --color/--size
    Remove {
        id: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
    },
    /// Set a quantity; zero or less removes
    Update {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
    },
    /// Empty the cart
    Clear,
}

fn variant(id: String, color: Option<String>, size: Option<String>) -> Option<VariantKey> {
    (color.is_some() || size.is_some()).then(|| VariantKey {
        product_id: ProductId::new(id),
        color,
        size,
    })
}

fn show(shop: &Storefront) {
    if shop.cart.is_empty() {
        info!("Your cart is empty.");
        return;
    }
    for line in shop.cart.lines() {
        info!("{}", cart_line(line));
    }
    info!(
        "{} item(s), total {}",
        shop.cart.item_count(),
        shop.cart.total()
    );
}

/// Run a `cart` subcommand.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched or the quantity is zero.
pub async fn run(shop: &mut Storefront, action: CartAction) -> Result<(), AppError> {
    match action {
        CartAction::Show => {}
        CartAction::Add {
            id,
            quantity,
            color,
            size,
        } => {
            let product = shop.catalog().get_product(&ProductId::new(id)).await?;
            let line =
                CartLine::from_product(&product, quantity, color.as_deref(), size.as_deref());
            shop.cart.add_item(line)?;
            info!("Added {} to cart", product.name);
        }
        CartAction::Remove { id, color, size } => match variant(id.clone(), color, size) {
            Some(key) => shop.cart.remove_line(&key),
            None => shop.cart.remove_item(&ProductId::new(id)),
        },
        CartAction::Update {
            id,
            quantity,
            color,
            size,
        } => match variant(id.clone(), color, size) {
            Some(key) => shop.cart.set_line_quantity(&key, quantity),
            None => shop.cart.update_quantity(&ProductId::new(id), quantity),
        },
        CartAction::Clear => shop.cart.clear_cart(),
    }
    show(shop);
    Ok(())
}
