//! In-memory catalog backend.
//!
//! Implements the same query semantics as the Firestore backend over a
//! vector of products. Used by tests and by the CLI when no Firebase project
//! is configured.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use lumina_core::{Product, ProductId};

use super::{CatalogBackend, CatalogError, Highlight, PageCursor, ProductPage};

/// Products held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<Vec<Product>>,
    unavailable: AtomicBool,
}

impl MemoryCatalog {
    /// A catalog seeded with `products`.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every call fail with [`CatalogError::Unavailable`], as a backend
    /// outage would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every stored product, in storage order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Product> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Product>> {
        self.products.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Product>> {
        self.products.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable(
                "in-memory catalog is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn select(&self, limit: usize, predicate: impl Fn(&Product) -> bool) -> Vec<Product> {
        self.read()
            .iter()
            .filter(|product| predicate(product))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalog {
    async fn list_page(
        &self,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> Result<ProductPage, CatalogError> {
        self.check_available()?;
        let products = self.read();

        let mut ordered: Vec<&Product> = products
            .iter()
            .filter(|product| after.is_none_or(|cursor| cursor.precedes(product)))
            .collect();
        ordered.sort_by(|a, b| (b.date_added, &b.id).cmp(&(a.date_added, &a.id)));

        let has_more = ordered.len() > limit;
        let page: Vec<Product> = ordered.into_iter().take(limit).cloned().collect();
        let next_cursor = if has_more {
            page.last().map(PageCursor::after)
        } else {
            None
        };

        Ok(ProductPage {
            products: page,
            next_cursor,
            total: products.len(),
        })
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        self.check_available()?;
        Ok(self.read().iter().find(|product| &product.id == id).cloned())
    }

    async fn flagged(&self, flag: Highlight, limit: usize) -> Result<Vec<Product>, CatalogError> {
        self.check_available()?;
        Ok(self.select(limit, |product| flag.is_set_on(product)))
    }

    async fn name_prefix(
        &self,
        lower_key: &str,
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        self.check_available()?;
        let mut matches = self.select(usize::MAX, |product| product.matches_name_prefix(lower_key));
        // A range query on `nameLower` returns results in index order.
        matches.sort_by_key(Product::search_name);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn keywords_any(
        &self,
        tokens: &[String],
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        self.check_available()?;
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        Ok(self.select(limit, |product| product.matches_any_keyword(&tokens)))
    }

    async fn insert(&self, product: &Product) -> Result<(), CatalogError> {
        self.check_available()?;
        let mut products = self.write();
        if products.iter().any(|existing| existing.id == product.id) {
            return Err(CatalogError::Unavailable(format!(
                "product {} already exists",
                product.id
            )));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), CatalogError> {
        self.check_available()?;
        let mut products = self.write();
        let existing = products
            .iter_mut()
            .find(|existing| existing.id == product.id)
            .ok_or_else(|| CatalogError::NotFound(product.id.clone()))?;
        *existing = product.clone();
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.check_available()?;
        self.write().retain(|product| &product.id != id);
        Ok(())
    }
}
