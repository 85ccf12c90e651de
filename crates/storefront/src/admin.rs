//! Admin catalog management.
//!
//! Product create/update/delete for users with the `ADMIN` role. Image
//! upload happens elsewhere; forms carry image references as strings.

use chrono::Utc;
use lumina_core::{Price, Product, ProductId, User, ValidationErrors, trimmed_len};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::auth::AuthState;
use crate::catalog::{CatalogClient, PageCursor, ProductPage};
use crate::error::{AppError, add_breadcrumb};

// =============================================================================
// Product form
// =============================================================================

/// Raw add/edit product input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub max_quantity: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub available_colors: Vec<String>,
    #[serde(default)]
    pub available_sizes: Vec<String>,
    /// Primary image reference. Required when adding; kept when editing.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_collection: Vec<String>,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            brand: String::new(),
            price: Decimal::ZERO,
            category: "Footwear".to_string(),
            max_quantity: 1,
            description: String::new(),
            is_featured: false,
            is_recommended: false,
            keywords: Vec::new(),
            available_colors: Vec::new(),
            available_sizes: Vec::new(),
            image: None,
            image_collection: Vec::new(),
        }
    }
}

/// Checked product fields, ready to merge into a [`Product`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub brand: String,
    pub price: Price,
    pub category: String,
    pub max_quantity: u32,
    pub description: String,
    pub is_featured: bool,
    pub is_recommended: bool,
    pub keywords: Vec<String>,
    pub available_colors: Vec<String>,
    pub available_sizes: Vec<String>,
    pub image: Option<String>,
    pub image_collection: Vec<String>,
}

/// Trim, drop blanks and repeats, keep first-seen order.
fn clean_tags(tags: &[String], lowercase: bool) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        let tag = if lowercase {
            tag.to_lowercase()
        } else {
            tag.to_string()
        };
        if !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

impl ProductForm {
    /// Prefill the edit form.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price.amount(),
            category: product.category.clone(),
            max_quantity: product.max_quantity,
            description: product.description.clone(),
            is_featured: product.is_featured,
            is_recommended: product.is_recommended,
            keywords: product.keywords.clone(),
            available_colors: product.available_colors.clone(),
            available_sizes: product.available_sizes.clone(),
            image: Some(product.image.clone()).filter(|image| !image.is_empty()),
            image_collection: product.image_collection.clone(),
        }
    }

    /// Check every field.
    ///
    /// Keywords are lower-cased; tags are trimmed and de-duplicated before
    /// the "at least one" checks.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<ProductDraft, ValidationErrors> {
        let keywords = clean_tags(&self.keywords, true);
        let available_colors = clean_tags(&self.available_colors, false);
        let available_sizes = clean_tags(&self.available_sizes, false);

        let mut errors = ValidationErrors::new();
        errors.check(
            trimmed_len(&self.name) >= 3,
            "name",
            "Name must be at least 3 characters",
        );
        errors.check(trimmed_len(&self.brand) >= 1, "brand", "Brand is required");
        let price = Price::new(self.price).ok().filter(|_| self.price >= Decimal::ONE);
        errors.check(price.is_some(), "price", "Price must be greater than 0");
        errors.check(
            trimmed_len(&self.category) >= 1,
            "category",
            "Category is required",
        );
        errors.check(
            self.max_quantity >= 1,
            "maxQuantity",
            "Available stock is required",
        );
        errors.check(
            trimmed_len(&self.description) >= 10,
            "description",
            "Description must be at least 10 characters",
        );
        errors.check(
            !keywords.is_empty(),
            "keywords",
            "At least one keyword is required",
        );
        errors.check(
            !available_colors.is_empty(),
            "availableColors",
            "At least one color is required",
        );
        errors.check(
            !available_sizes.is_empty(),
            "availableSizes",
            "At least one size is required",
        );

        match price {
            Some(price) if errors.is_empty() => Ok(ProductDraft {
                name: self.name.trim().to_string(),
                brand: self.brand.trim().to_string(),
                price,
                category: self.category.trim().to_string(),
                max_quantity: self.max_quantity,
                description: self.description.trim().to_string(),
                is_featured: self.is_featured,
                is_recommended: self.is_recommended,
                keywords,
                available_colors,
                available_sizes,
                image: self
                    .image
                    .as_deref()
                    .map(str::trim)
                    .filter(|image| !image.is_empty())
                    .map(str::to_string),
                image_collection: clean_tags(&self.image_collection, false),
            }),
            _ => Err(errors),
        }
    }
}

impl ProductDraft {
    fn apply_to(self, product: &mut Product) {
        product.name_lower = self.name.to_lowercase();
        product.name = self.name;
        product.brand = self.brand;
        product.price = self.price;
        product.category = self.category;
        product.max_quantity = self.max_quantity;
        product.description = self.description;
        product.is_featured = self.is_featured;
        product.is_recommended = self.is_recommended;
        product.keywords = self.keywords;
        product.available_colors = self.available_colors;
        product.available_sizes = self.available_sizes;
        if let Some(image) = self.image {
            product.image = image;
        }
        product.image_collection = self.image_collection;
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// All products in the catalog.
    pub total_products: usize,
    /// Products on the fetched page.
    pub sampled: usize,
    pub featured: usize,
    pub recommended: usize,
    pub out_of_stock: usize,
}

impl DashboardSummary {
    /// Summarize one fetched page.
    #[must_use]
    pub fn from_page(page: &ProductPage) -> Self {
        let products = &page.products;
        Self {
            total_products: page.total,
            sampled: products.len(),
            featured: products.iter().filter(|p| p.is_featured).count(),
            recommended: products.iter().filter(|p| p.is_recommended).count(),
            out_of_stock: products.iter().filter(|p| !p.is_in_stock()).count(),
        }
    }
}

// =============================================================================
// AdminCatalog
// =============================================================================

/// Role-checked catalog writes.
#[derive(Debug, Clone)]
pub struct AdminCatalog {
    catalog: CatalogClient,
}

/// The signed-in admin, or why there isn't one.
fn require_admin(auth: &AuthState) -> Result<&User, AppError> {
    let user = auth
        .user
        .as_ref()
        .filter(|_| auth.is_authenticated)
        .ok_or_else(|| AppError::Unauthorized("sign in required".to_string()))?;
    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, "Non-admin attempted a catalog write");
        return Err(AppError::Forbidden("admin role required".to_string()));
    }
    Ok(user)
}

impl AdminCatalog {
    #[must_use]
    pub const fn new(catalog: CatalogClient) -> Self {
        Self { catalog }
    }

    /// Newest-first product listing for the admin table.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`Forbidden` without an admin session, or a
    /// catalog error.
    pub async fn list(
        &self,
        auth: &AuthState,
        after: Option<&PageCursor>,
    ) -> Result<ProductPage, AppError> {
        require_admin(auth)?;
        Ok(self.catalog.list_products(after).await?)
    }

    /// Add a product.
    ///
    /// Assigns a fresh id, the lower-cased search name and the creation
    /// time. A primary image reference is required.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`Forbidden` without an admin session,
    /// `Validation` for a bad form, or a catalog error.
    #[instrument(skip(self, auth, form), fields(name = %form.name.trim()))]
    pub async fn create(&self, auth: &AuthState, form: &ProductForm) -> Result<Product, AppError> {
        let admin = require_admin(auth)?;
        let draft = match form.validate() {
            Ok(draft) if draft.image.is_none() => {
                let mut errors = ValidationErrors::new();
                errors.add("image", "Please upload a primary image for the product.");
                return Err(errors.into());
            }
            Ok(draft) => draft,
            Err(errors) => return Err(errors.into()),
        };

        let mut product = Product {
            id: self.catalog.generate_id(),
            name: String::new(),
            name_lower: String::new(),
            brand: String::new(),
            price: Price::ZERO,
            description: String::new(),
            image: String::new(),
            image_collection: Vec::new(),
            category: String::new(),
            is_featured: false,
            is_recommended: false,
            available_colors: Vec::new(),
            available_sizes: Vec::new(),
            max_quantity: 0,
            keywords: Vec::new(),
            date_added: Utc::now(),
        };
        draft.apply_to(&mut product);

        self.catalog.add_product(&product).await?;
        add_breadcrumb("admin", "Product added", Some(&[("product_id", product.id.as_str())]));
        info!(product_id = %product.id, admin_id = %admin.id, "Product added");
        Ok(product)
    }

    /// Replace the editable fields of an existing product.
    ///
    /// The id and creation time are kept; the image is kept unless the form
    /// names a new one.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`Forbidden` without an admin session,
    /// `Validation` for a bad form, `Catalog(NotFound)` for an unknown id, or
    /// a catalog error.
    #[instrument(skip(self, auth, form), fields(id = %id))]
    pub async fn update(
        &self,
        auth: &AuthState,
        id: &ProductId,
        form: &ProductForm,
    ) -> Result<Product, AppError> {
        let admin = require_admin(auth)?;
        let draft = form.validate()?;
        let mut product = self.catalog.get_product(id).await?;
        draft.apply_to(&mut product);

        self.catalog.update_product(&product).await?;
        add_breadcrumb("admin", "Product updated", Some(&[("product_id", id.as_str())]));
        info!(product_id = %id, admin_id = %admin.id, "Product updated");
        Ok(product)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`Forbidden` without an admin session, or a
    /// catalog error.
    #[instrument(skip(self, auth), fields(id = %id))]
    pub async fn delete(&self, auth: &AuthState, id: &ProductId) -> Result<(), AppError> {
        let admin = require_admin(auth)?;
        self.catalog.delete_product(id).await?;
        add_breadcrumb("admin", "Product deleted", Some(&[("product_id", id.as_str())]));
        info!(product_id = %id, admin_id = %admin.id, "Product deleted");
        Ok(())
    }

    /// Dashboard counts over the first listing page.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized`/`Forbidden` without an admin session, or a
    /// catalog error.
    pub async fn dashboard(&self, auth: &AuthState) -> Result<DashboardSummary, AppError> {
        require_admin(auth)?;
        let page = self.catalog.list_products(None).await?;
        Ok(DashboardSummary::from_page(&page))
    }
}
