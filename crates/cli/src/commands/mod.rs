//! CLI command implementations.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod fixture;
pub mod products;

use lumina_core::Product;
use lumina_storefront::cart::CartLine;

/// One-line product summary.
pub fn product_line(product: &Product) -> String {
    let stock = if product.is_in_stock() {
        format!("{} in stock", product.max_quantity)
    } else {
        "out of stock".to_string()
    };
    format!(
        "{id}  {name} ({brand})  {price}  [{stock}]",
        id = product.id,
        name = product.name,
        brand = product.brand,
        price = product.price,
    )
}

/// One-line cart line summary.
pub fn cart_line(line: &CartLine) -> String {
    let variant = [line.selected_color.as_deref(), line.selected_size.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("/");
    format!(
        "{id}  {name} [{variant}]  {qty} x {price} = {total}",
        id = line.id,
        name = line.name,
        qty = line.quantity,
        price = line.price,
        total = line.line_total(),
    )
}
