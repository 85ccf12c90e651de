//! Admin catalog commands.
//!
//! Product forms are read from YAML files using the document field names:
//!
//! ```yaml
//! name: Linen Shirt
//! brand: Salt
//! price: "45.00"
//! category: Tops
//! maxQuantity: 5
//! description: Breathable linen for hot days.
//! keywords: [linen, shirt]
//! availableColors: ["#ffffff"]
//! availableSizes: [S, M, L]
//! image: products/linen.jpg
//! ```

use std::path::{Path, PathBuf};

use clap::Subcommand;
use lumina_core::ProductId;
use lumina_storefront::admin::ProductForm;
use lumina_storefront::state::Storefront;
use tracing::info;

use super::product_line;

#[derive(Subcommand)]
pub enum AdminAction {
    /// Add a product from a YAML form
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace a product's fields from a YAML form
    Update {
        id: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a product
    Delete { id: String },
    /// Catalog counts
    Dashboard,
}

async fn read_form(path: &Path) -> Result<ProductForm, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("could not read {}: {e}", path.display()))?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Run an `admin` subcommand.
///
/// # Errors
///
/// Returns an error if the form file is unreadable, the session is not an
/// admin, validation fails, or the catalog write fails.
pub async fn run(shop: &Storefront, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let auth = shop.auth.state();
    let admin = shop.admin();
    match action {
        AdminAction::Create { file } => {
            let form = read_form(&file).await?;
            let product = admin.create(auth, &form).await?;
            info!("Created {}", product_line(&product));
        }
        AdminAction::Update { id, file } => {
            let form = read_form(&file).await?;
            let product = admin.update(auth, &ProductId::new(id), &form).await?;
            info!("Updated {}", product_line(&product));
        }
        AdminAction::Delete { id } => {
            admin.delete(auth, &ProductId::new(&*id)).await?;
            info!("Deleted {id}");
        }
        AdminAction::Dashboard => {
            let summary = admin.dashboard(auth).await?;
            info!("Products:     {}", summary.total_products);
            info!("Featured:     {} of {} sampled", summary.featured, summary.sampled);
            info!("Recommended:  {} of {} sampled", summary.recommended, summary.sampled);
            info!("Out of stock: {} of {} sampled", summary.out_of_stock, summary.sampled);
        }
    }
    Ok(())
}
