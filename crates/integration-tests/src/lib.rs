//! Integration tests for Lumina Boutique.
//!
//! This crate holds end-to-end scenarios that drive a whole
//! [`Storefront`] over the in-memory backends: catalog, accounts and local
//! storage. Each test builds its own [`Harness`], so tests never share
//! state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lumina-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use chrono::DateTime;
use lumina_core::{Price, Product, ProductId, User, UserRole};
use lumina_storefront::auth::{AuthError, MemoryIdentity, SignInForm};
use lumina_storefront::catalog::MemoryCatalog;
use lumina_storefront::checkout::{PaymentForm, PaymentMethod, ShippingForm};
use lumina_storefront::config::StorefrontConfig;
use lumina_storefront::state::{Backends, Storefront};
use lumina_storefront::storage::MemoryStorage;
use secrecy::SecretString;

pub const SHOPPER_EMAIL: &str = "ana@example.com";
pub const ADMIN_EMAIL: &str = "owner@example.com";
pub const PASSWORD: &str = "hunter22";

// =============================================================================
// Products
// =============================================================================

/// A product with two colors and three sizes, added `minute` minutes after
/// the epoch.
#[must_use]
pub fn product(id: &str, name: &str, brand: &str, dollars: u32, minute: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        name_lower: name.to_lowercase(),
        brand: brand.to_string(),
        price: Price::from_dollars(dollars),
        description: format!("{name} by {brand}"),
        image: format!("products/{id}.jpg"),
        image_collection: Vec::new(),
        category: "Tops".to_string(),
        is_featured: false,
        is_recommended: false,
        available_colors: vec!["red".to_string(), "blue".to_string()],
        available_sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
        max_quantity: 10,
        keywords: Vec::new(),
        date_added: DateTime::from_timestamp_millis(minute * 60_000).unwrap_or_default(),
    }
}

/// `product` with search keywords.
#[must_use]
pub fn with_keywords(mut product: Product, keywords: &[&str]) -> Product {
    product.keywords = keywords.iter().map(|k| (*k).to_string()).collect();
    product
}

/// The default catalog: P1 at 20, P2 at 15, plus a few more to browse.
#[must_use]
pub fn catalog() -> Vec<Product> {
    let mut linen = with_keywords(product("P1", "Linen Shirt", "Salt", 20, 5), &["summer"]);
    linen.is_featured = true;
    let mut hat = with_keywords(product("P2", "Straw Hat", "Sol", 15, 4), &["summer", "linen"]);
    hat.is_recommended = true;
    vec![
        linen,
        hat,
        product("P3", "Wool Coat", "Salt", 120, 3),
        product("P4", "Leather Boots", "Ridge", 85, 2),
        product("P5", "Linen Trousers", "Sol", 40, 1),
    ]
}

// =============================================================================
// Harness
// =============================================================================

/// A storefront plus handles on the backends behind it.
pub struct Harness {
    pub shop: Storefront,
    pub catalog: Arc<MemoryCatalog>,
    pub identity: Arc<MemoryIdentity>,
    pub storage: Arc<MemoryStorage>,
    config: StorefrontConfig,
}

impl Harness {
    /// A storefront over [`catalog`] with one shopper and one admin account.
    #[must_use]
    pub fn new() -> Self {
        Self::with_products(catalog())
    }

    #[must_use]
    pub fn with_products(products: Vec<Product>) -> Self {
        Self::with_config(products, StorefrontConfig::default())
    }

    #[must_use]
    pub fn with_config(products: Vec<Product>, config: StorefrontConfig) -> Self {
        let identity = MemoryIdentity::new();
        identity.add_account(SHOPPER_EMAIL, PASSWORD, "Ana Cruz", UserRole::User);
        identity.add_account(ADMIN_EMAIL, PASSWORD, "Store Owner", UserRole::Admin);

        let catalog = Arc::new(MemoryCatalog::new(products));
        let identity = Arc::new(identity);
        let storage = Arc::new(MemoryStorage::new());
        let shop = Storefront::new(config.clone(), Self::backends(&catalog, &identity, &storage));
        Self {
            shop,
            catalog,
            identity,
            storage,
            config,
        }
    }

    fn backends(
        catalog: &Arc<MemoryCatalog>,
        identity: &Arc<MemoryIdentity>,
        storage: &Arc<MemoryStorage>,
    ) -> Backends {
        Backends {
            catalog: catalog.clone(),
            identity: identity.clone(),
            storage: storage.clone(),
        }
    }

    /// A fresh storefront over the same backends, as after an app restart.
    #[must_use]
    pub fn restart(&self) -> Storefront {
        Storefront::new(
            self.config.clone(),
            Self::backends(&self.catalog, &self.identity, &self.storage),
        )
    }

    /// Sign in as `email` with the shared test password.
    ///
    /// # Errors
    ///
    /// Returns the provider's error for an unknown account.
    pub async fn sign_in(&mut self, email: &str) -> Result<User, AuthError> {
        let form = SignInForm {
            email: email.to_string(),
            password: SecretString::from(PASSWORD),
        };
        self.shop.auth.sign_in(&form).await
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Shipping input that passes validation.
#[must_use]
pub fn shipping_form(is_international: bool) -> ShippingForm {
    ShippingForm {
        fullname: "Ana Cruz".to_string(),
        email: SHOPPER_EMAIL.to_string(),
        address: "12 Mabini St, Manila".to_string(),
        mobile: "09171234567".to_string(),
        is_international,
    }
}

/// Card payment input that passes validation.
#[must_use]
pub fn payment_form() -> PaymentForm {
    PaymentForm {
        method: PaymentMethod::CreditCard,
        name: "Ana Cruz".to_string(),
        card_number: "4111111111111111".to_string(),
        expiry: "12/30".to_string(),
        ccv: "123".to_string(),
    }
}
