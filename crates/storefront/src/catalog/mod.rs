//! Product catalog access.
//!
//! # Architecture
//!
//! - [`CatalogBackend`] is the seam to the document store: Firestore in
//!   production ([`FirestoreCatalog`]), [`MemoryCatalog`] for tests and
//!   fixture-driven sessions
//! - [`CatalogClient`] sits in front of a backend, caches reads via `moka`
//!   and implements search as the union of two backend lookups
//! - [`FetchGuard`] hands out per-view tickets so a late response for
//!   superseded parameters can be dropped instead of overwriting newer state
//!
//! # Example
//!
//! ```rust,ignore
//! let catalog = CatalogClient::new(Arc::new(MemoryCatalog::new(products)), &config.catalog);
//!
//! let ticket = catalog.guard().begin("shop");
//! let page = catalog.list_products(None).await?;
//! if let Some(page) = ticket.accept(page) {
//!     render(page);
//! }
//! ```

mod cache;
mod client;
mod firestore;
mod generation;
mod memory;

pub use client::CatalogClient;
pub use firestore::FirestoreCatalog;
pub use generation::{FetchGuard, FetchTicket};
pub use memory::MemoryCatalog;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lumina_core::{Product, ProductId};
use thiserror::Error;

use crate::firestore::FirestoreError;

/// Errors that can occur when reading or writing the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product has this id.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The Firestore backend failed.
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// The backend could not serve the request.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// A page cursor could not be parsed.
    #[error("Invalid page cursor: {0}")]
    InvalidCursor(String),
}

/// Boolean listing flags on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    Featured,
    Recommended,
}

impl Highlight {
    /// Document field holding the flag.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Featured => "isFeatured",
            Self::Recommended => "isRecommended",
        }
    }

    /// Whether `product` carries this flag.
    #[must_use]
    pub const fn is_set_on(self, product: &Product) -> bool {
        match self {
            Self::Featured => product.is_featured,
            Self::Recommended => product.is_recommended,
        }
    }
}

/// Position after the last product of a page.
///
/// Listings are ordered by `date_added` descending, then id descending, so
/// the pair identifies a unique position even when timestamps collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCursor {
    pub date_added: DateTime<Utc>,
    pub id: ProductId,
}

impl PageCursor {
    /// The cursor positioned after `product`.
    #[must_use]
    pub fn after(product: &Product) -> Self {
        Self {
            date_added: product.date_added,
            id: product.id.clone(),
        }
    }

    /// Whether `product` sorts strictly after this cursor.
    #[must_use]
    pub fn precedes(&self, product: &Product) -> bool {
        (product.date_added, &product.id) < (self.date_added, &self.id)
    }
}

/// Opaque text form: `<epoch millis>:<id>`.
impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.date_added.timestamp_millis(), self.id)
    }
}

impl FromStr for PageCursor {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CatalogError::InvalidCursor(s.to_string());
        let (millis, id) = s.split_once(':').ok_or_else(invalid)?;
        let millis = millis.parse::<i64>().map_err(|_| invalid())?;
        if id.is_empty() {
            return Err(invalid());
        }
        let date_added = DateTime::from_timestamp_millis(millis).ok_or_else(invalid)?;
        Ok(Self {
            date_added,
            id: ProductId::new(id),
        })
    }
}

/// One page of the newest-first listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Cursor for the following page; `None` on the last page.
    pub next_cursor: Option<PageCursor>,
    /// Total products in the catalog.
    pub total: usize,
}

/// The document store holding the `products` collection.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Up to `limit` products after `after`, newest first.
    async fn list_page(
        &self,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> Result<ProductPage, CatalogError>;

    /// One product, or `None`.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Up to `limit` products with `flag` set.
    async fn flagged(&self, flag: Highlight, limit: usize) -> Result<Vec<Product>, CatalogError>;

    /// Up to `limit` products whose lower-cased name starts with `lower_key`.
    async fn name_prefix(&self, lower_key: &str, limit: usize)
    -> Result<Vec<Product>, CatalogError>;

    /// Up to `limit` products with a keyword equal to any of `tokens`.
    async fn keywords_any(
        &self,
        tokens: &[String],
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError>;

    /// Store a new product under its id.
    async fn insert(&self, product: &Product) -> Result<(), CatalogError>;

    /// Replace an existing product.
    async fn update(&self, product: &Product) -> Result<(), CatalogError>;

    /// Remove a product.
    async fn delete(&self, id: &ProductId) -> Result<(), CatalogError>;

    /// A fresh document id.
    fn generate_id(&self) -> ProductId {
        ProductId::generate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_text_form() {
        let cursor: PageCursor = "1700000000000:abc".parse().unwrap();
        assert_eq!(cursor.id.as_str(), "abc");
        assert_eq!(cursor.to_string(), "1700000000000:abc");
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!("abc".parse::<PageCursor>().is_err());
        assert!("x:abc".parse::<PageCursor>().is_err());
        assert!("12:".parse::<PageCursor>().is_err());
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::NotFound(ProductId::new("p-123"));
        assert_eq!(err.to_string(), "Product not found: p-123");
    }
}
