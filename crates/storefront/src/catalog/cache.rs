//! Cache types for catalog responses.

use lumina_core::{Product, ProductId};

use super::{Highlight, PageCursor, ProductPage};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Page { after: Option<PageCursor>, limit: usize },
    Product(ProductId),
    Highlight { flag: Highlight, limit: usize },
    Search(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Page(ProductPage),
    Product(Box<Product>),
    Products(Vec<Product>),
}
