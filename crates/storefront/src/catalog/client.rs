//! Cached catalog client.

use std::collections::HashSet;
use std::sync::Arc;

use lumina_core::{Product, ProductId};
use moka::future::Cache;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::generation::FetchGuard;
use super::{CatalogBackend, CatalogError, Highlight, PageCursor, ProductPage};
use crate::config::CatalogConfig;

// =============================================================================
// CatalogClient
// =============================================================================

/// Read access to the catalog plus the admin pass-through writes.
///
/// Reads are cached for the configured TTL; any write clears the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    backend: Arc<dyn CatalogBackend>,
    cache: Cache<CacheKey, CacheValue>,
    guard: FetchGuard,
    products_per_page: usize,
    search_limit: usize,
    highlight_limit: usize,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("products_per_page", &self.inner.products_per_page)
            .field("search_limit", &self.inner.search_limit)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a client over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                backend,
                cache,
                guard: FetchGuard::new(),
                products_per_page: config.products_per_page,
                search_limit: config.search_limit,
                highlight_limit: config.highlight_limit,
            }),
        }
    }

    /// Ticket issuer for dropping superseded responses.
    #[must_use]
    pub fn guard(&self) -> &FetchGuard {
        &self.inner.guard
    }

    /// Default size of the featured and recommended listings.
    #[must_use]
    pub fn highlight_limit(&self) -> usize {
        self.inner.highlight_limit
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// One page of the newest-first listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(after = ?after.map(ToString::to_string)))]
    pub async fn list_products(
        &self,
        after: Option<&PageCursor>,
    ) -> Result<ProductPage, CatalogError> {
        let limit = self.inner.products_per_page;
        let cache_key = CacheKey::Page {
            after: after.cloned(),
            limit,
        };

        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(page);
        }

        let page = self.inner.backend.list_page(after, limit).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(page.clone()))
            .await;

        Ok(page)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has this id, or an
    /// error if the backend request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self
            .inner
            .backend
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Up to `limit` featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    pub async fn featured_products(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        self.highlighted(Highlight::Featured, limit).await
    }

    /// Up to `limit` recommended products.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    pub async fn recommended_products(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        self.highlighted(Highlight::Recommended, limit).await
    }

    #[instrument(skip(self))]
    async fn highlighted(&self, flag: Highlight, limit: usize) -> Result<Vec<Product>, CatalogError> {
        let cache_key = CacheKey::Highlight { flag, limit };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for highlighted products");
            return Ok(products);
        }

        let products = self.inner.backend.flagged(flag, limit).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Search by name prefix and keywords.
    ///
    /// Runs both lookups concurrently and returns name matches first, then
    /// keyword matches not already present. A blank key matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend lookup fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn search_products(&self, key: &str) -> Result<Vec<Product>, CatalogError> {
        let lower_key = key.trim().to_lowercase();
        if lower_key.is_empty() {
            return Ok(Vec::new());
        }

        let cache_key = CacheKey::Search(lower_key.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for search");
            return Ok(products);
        }

        let tokens: Vec<String> = lower_key.split_whitespace().map(str::to_string).collect();
        let limit = self.inner.search_limit;
        let (by_name, by_keyword) = tokio::try_join!(
            self.inner.backend.name_prefix(&lower_key, limit),
            self.inner.backend.keywords_any(&tokens, limit),
        )?;

        let products = merge_unique(by_name, by_keyword);
        debug!(count = products.len(), "Search results merged");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Admin Writes
    // =========================================================================

    /// A fresh product id from the backend.
    #[must_use]
    pub fn generate_id(&self) -> ProductId {
        self.inner.backend.generate_id()
    }

    /// Store a new product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn add_product(&self, product: &Product) -> Result<(), CatalogError> {
        self.inner.backend.insert(product).await?;
        self.invalidate();
        Ok(())
    }

    /// Replace an existing product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the write fails.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn update_product(&self, product: &Product) -> Result<(), CatalogError> {
        self.inner.backend.update(product).await?;
        self.invalidate();
        Ok(())
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.inner.backend.delete(id).await?;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        debug!("Invalidating catalog cache");
        self.inner.cache.invalidate_all();
    }
}

/// `first` followed by the products of `second` not already in `first`.
fn merge_unique(first: Vec<Product>, second: Vec<Product>) -> Vec<Product> {
    let mut seen: HashSet<ProductId> = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|product| seen.insert(product.id.clone()))
        .collect()
}
