//! Storefront context wiring the stores to their collaborators.
//!
//! One [`Storefront`] is built at startup and passed to whatever surface
//! drives it (the CLI here). The stores are plain owned values; every
//! mutation goes through `&mut Storefront`.

use std::sync::Arc;

use lumina_core::Product;
use thiserror::Error;
use tracing::info;

use crate::admin::AdminCatalog;
use crate::auth::{AuthError, AuthStore, FirebaseIdentity, IdentityProvider, MemoryIdentity};
use crate::cart::CartStore;
use crate::catalog::{CatalogBackend, CatalogClient, FirestoreCatalog, MemoryCatalog};
use crate::checkout::{
    CheckoutStep, CheckoutStore, Completion, PaymentForm, ShippingForm, StepGate, Totals,
};
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::filter::FilterStore;
use crate::firestore::{FirestoreClient, FirestoreError};
use crate::navigation::{GuardDecision, Route, guard};
use crate::storage::{FileStorage, LocalStorage};

/// Error building the storefront's backends.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("firestore client: {0}")]
    Firestore(#[from] FirestoreError),
    #[error("identity provider: {0}")]
    Identity(#[from] AuthError),
}

/// The external collaborators a storefront runs against.
#[derive(Clone)]
pub struct Backends {
    pub catalog: Arc<dyn CatalogBackend>,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

impl Backends {
    /// Firestore and Firebase Authentication when configured; otherwise an
    /// in-memory catalog seeded with `seed` and in-memory accounts.
    ///
    /// Local storage is always the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(
        config: &StorefrontConfig,
        seed: Vec<Product>,
        accounts: MemoryIdentity,
    ) -> Result<Self, StateError> {
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(&config.data_dir));

        let Some(firebase) = &config.firebase else {
            info!(products = seed.len(), "Using in-memory catalog");
            return Ok(Self {
                catalog: Arc::new(MemoryCatalog::new(seed)),
                identity: Arc::new(accounts),
                storage,
            });
        };

        let timeout = config.catalog.request_timeout;
        let firestore = FirestoreClient::new(firebase, timeout)?;
        let identity = FirebaseIdentity::new(firebase, firestore.clone(), timeout)?;
        info!(project_id = %firebase.project_id, "Using Firestore catalog");
        Ok(Self {
            catalog: Arc::new(FirestoreCatalog::new(firestore)),
            identity: Arc::new(identity),
            storage,
        })
    }
}

// =============================================================================
// Storefront
// =============================================================================

/// All shopper-side state plus the catalog and admin clients.
pub struct Storefront {
    config: StorefrontConfig,
    catalog: CatalogClient,
    admin: AdminCatalog,
    pub cart: CartStore,
    pub filters: FilterStore,
    pub checkout: CheckoutStore,
    pub auth: AuthStore,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("cart", &self.cart)
            .field("filters", &self.filters)
            .field("checkout", &self.checkout)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Restore every store from local storage.
    #[must_use]
    pub fn new(config: StorefrontConfig, backends: Backends) -> Self {
        let catalog = CatalogClient::new(backends.catalog, &config.catalog);
        Self {
            admin: AdminCatalog::new(catalog.clone()),
            cart: CartStore::restore(backends.storage.clone()),
            filters: FilterStore::new(config.filters),
            checkout: CheckoutStore::restore(backends.storage.clone(), config.checkout.clone()),
            auth: AuthStore::restore(backends.identity, backends.storage),
            catalog,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    #[must_use]
    pub const fn admin(&self) -> &AdminCatalog {
        &self.admin
    }

    /// Whether the current session may open `route`.
    #[must_use]
    pub fn guard(&self, route: &Route) -> GuardDecision {
        guard(route, self.auth.state())
    }

    /// Gate for a checkout step: sign-in first, then cart and draft checks.
    #[must_use]
    pub fn enter_checkout(&self, step: CheckoutStep) -> Result<StepGate, GuardDecision> {
        match self.guard(&step.route()) {
            GuardDecision::Allow => Ok(self.checkout.enter(step, &self.cart)),
            decision => Err(decision),
        }
    }

    /// Shipping form for step 2, prefilled from the draft or the profile.
    #[must_use]
    pub fn shipping_form(&self) -> ShippingForm {
        self.checkout.shipping_prefill(self.auth.user())
    }

    /// Step 2 against the live cart.
    ///
    /// # Errors
    ///
    /// See [`CheckoutStore::submit_shipping`].
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<Totals, AppError> {
        self.checkout.submit_shipping(&self.cart, form)
    }

    /// Step 3 against the live cart; clears the cart on success.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when signed out, otherwise see
    /// [`CheckoutStore::submit_payment`].
    pub fn place_order(&mut self, form: &PaymentForm) -> Result<Completion, AppError> {
        if !self.auth.is_authenticated() {
            return Err(AppError::Unauthorized("sign in to check out".to_string()));
        }
        self.checkout.submit_payment(&mut self.cart, form)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use lumina_core::UserRole;

    fn storefront() -> Storefront {
        let accounts = MemoryIdentity::new();
        accounts.add_account("ana@example.com", "hunter22", "Ana Cruz", UserRole::User);
        let backends = Backends {
            catalog: Arc::new(MemoryCatalog::new(Vec::new())),
            identity: Arc::new(accounts),
            storage: Arc::new(MemoryStorage::new()),
        };
        Storefront::new(StorefrontConfig::default(), backends)
    }

    #[test]
    fn test_checkout_needs_sign_in_before_cart_checks() {
        let shop = storefront();
        assert_eq!(
            shop.enter_checkout(CheckoutStep::Review),
            Err(GuardDecision::Redirect(Route::SignIn))
        );
    }

    #[test]
    fn test_place_order_signed_out() {
        let mut shop = storefront();
        let err = shop.place_order(&PaymentForm::default()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_memory_backends_without_firebase() {
        let dir = std::env::temp_dir().join(format!("lumina-state-{}", std::process::id()));
        let config = StorefrontConfig {
            data_dir: dir,
            ..StorefrontConfig::default()
        };
        let backends = Backends::from_config(&config, Vec::new(), MemoryIdentity::new()).unwrap();
        let shop = Storefront::new(config, backends);
        assert!(shop.cart.is_empty());
        assert!(!shop.auth.is_authenticated());
    }
}
