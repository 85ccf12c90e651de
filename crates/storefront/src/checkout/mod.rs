//! Three-step checkout.
//!
//! Steps run `Review → Shipping → Payment → Complete`. The draft (shipping,
//! payment, done flag) is persisted under [`CHECKOUT_KEY`]; it is never sent
//! to a backend. Completing the payment step clears the cart.
//!
//! Totals are recomputed from the live cart on every call and never stored.

mod forms;

pub use forms::{PaymentDetails, PaymentForm, PaymentMethod, ShippingDetails, ShippingForm};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lumina_core::{Price, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cart::{CartLine, CartStore, subtotal};
use crate::config::CheckoutConfig;
use crate::error::{AppError, add_breadcrumb};
use crate::navigation::Route;
use crate::storage::{CHECKOUT_KEY, LocalStorage, load_snapshot, persist};

/// Checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckoutStep {
    /// Step 1: cart review.
    Review,
    /// Step 2: shipping details.
    Shipping,
    /// Step 3: payment.
    Payment,
    /// Order placed.
    Complete,
}

impl CheckoutStep {
    /// Route showing this step. `Complete` returns to the home page.
    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Self::Review => Route::CheckoutStep1,
            Self::Shipping => Route::CheckoutStep2,
            Self::Payment => Route::CheckoutStep3,
            Self::Complete => Route::Home,
        }
    }
}

/// Outcome of entering a checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepGate {
    /// The step can be shown.
    Ready,
    /// The cart is empty: show the empty-cart message with a link to the shop.
    EmptyCart,
    /// A prerequisite is missing: go to this step instead.
    Redirect(CheckoutStep),
}

/// Amounts shown at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Price,
    pub shipping_fee: Price,
    pub grand_total: Price,
}

impl Totals {
    /// Totals for `lines`, adding the international surcharge when flagged.
    #[must_use]
    pub fn compute(lines: &[CartLine], is_international: bool, config: &CheckoutConfig) -> Self {
        let subtotal = subtotal(lines);
        let shipping_fee = if is_international {
            config.shipping_fee + config.international_fee
        } else {
            config.shipping_fee
        };
        Self {
            subtotal,
            shipping_fee,
            grand_total: subtotal + shipping_fee,
        }
    }
}

/// What a completed checkout produced. Returned to the caller only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub lines: Vec<CartLine>,
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
    pub totals: Totals,
    pub placed_at: DateTime<Utc>,
}

/// Result of the payment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub order: OrderIntent,
    /// Where the shopper goes next.
    pub redirect: Route,
}

/// The persisted order draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    pub shipping: Option<ShippingDetails>,
    pub payment: Option<PaymentDetails>,
    pub is_done: bool,
}

/// The checkout state container.
pub struct CheckoutStore {
    draft: CheckoutDraft,
    config: CheckoutConfig,
    storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for CheckoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutStore")
            .field("draft", &self.draft)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CheckoutStore {
    /// Restore the draft from `storage`, starting blank if nothing usable is
    /// stored.
    #[must_use]
    pub fn restore(storage: Arc<dyn LocalStorage>, config: CheckoutConfig) -> Self {
        let draft = load_snapshot(storage.as_ref(), CHECKOUT_KEY).unwrap_or_default();
        Self {
            draft,
            config,
            storage,
        }
    }

    /// Read-only view of the draft.
    #[must_use]
    pub const fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    /// Fees and phone defaults in effect.
    #[must_use]
    pub const fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Whether the last checkout completed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.draft.is_done
    }

    pub fn set_shipping(&mut self, shipping: ShippingDetails) {
        self.draft.shipping = Some(shipping);
        self.persist();
    }

    pub fn set_payment(&mut self, payment: PaymentDetails) {
        self.draft.payment = Some(payment);
        self.persist();
    }

    pub fn set_done(&mut self, is_done: bool) {
        self.draft.is_done = is_done;
        self.persist();
    }

    /// Clear the draft.
    pub fn reset_checkout(&mut self) {
        self.draft = CheckoutDraft::default();
        self.persist();
    }

    /// Decide whether `step` can be shown for the current cart and draft.
    #[must_use]
    pub fn enter(&self, step: CheckoutStep, cart: &CartStore) -> StepGate {
        match step {
            CheckoutStep::Complete => StepGate::Ready,
            _ if cart.is_empty() => StepGate::EmptyCart,
            CheckoutStep::Payment if self.draft.shipping.is_none() => {
                StepGate::Redirect(CheckoutStep::Shipping)
            }
            _ => StepGate::Ready,
        }
    }

    /// The furthest step the shopper can currently reach.
    #[must_use]
    pub fn current_step(&self, cart: &CartStore) -> CheckoutStep {
        if self.draft.is_done && cart.is_empty() {
            CheckoutStep::Complete
        } else if self.draft.shipping.is_some() {
            CheckoutStep::Payment
        } else if cart.is_empty() {
            CheckoutStep::Review
        } else {
            CheckoutStep::Shipping
        }
    }

    /// Totals for the live cart and the stored shipping choice.
    #[must_use]
    pub fn totals(&self, cart: &CartStore) -> Totals {
        let is_international = self
            .draft
            .shipping
            .as_ref()
            .is_some_and(|s| s.is_international);
        Totals::compute(cart.lines(), is_international, &self.config)
    }

    /// Step 1: confirm the cart can be checked out.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyCart` when the cart has no lines.
    pub fn review(&self, cart: &CartStore) -> Result<Totals, AppError> {
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }
        Ok(self.totals(cart))
    }

    /// Shipping form defaults for step 2.
    #[must_use]
    pub fn shipping_prefill(&self, user: Option<&User>) -> ShippingForm {
        ShippingForm::prefill(self.draft.shipping.as_ref(), user)
    }

    /// Payment form defaults for step 3.
    #[must_use]
    pub fn payment_prefill(&self) -> PaymentForm {
        PaymentForm::prefill(self.draft.payment.as_ref())
    }

    /// Step 2: validate and store shipping details.
    ///
    /// Returns the totals including any international surcharge.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyCart` when the cart has no lines, or
    /// `AppError::Validation` with every failing field.
    pub fn submit_shipping(
        &mut self,
        cart: &CartStore,
        form: &ShippingForm,
    ) -> Result<Totals, AppError> {
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }
        let details = form.validate(&self.config)?;
        debug!(is_international = details.is_international, "Shipping details saved");
        self.set_shipping(details);
        Ok(self.totals(cart))
    }

    /// Step 3: validate payment, mark the draft done and clear the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptyCart` when the cart has no lines,
    /// `AppError::MissingShipping` when step 2 has not been completed, or
    /// `AppError::Validation` with every failing field.
    pub fn submit_payment(
        &mut self,
        cart: &mut CartStore,
        form: &PaymentForm,
    ) -> Result<Completion, AppError> {
        if cart.is_empty() {
            return Err(AppError::EmptyCart);
        }
        let shipping = self
            .draft
            .shipping
            .clone()
            .ok_or(AppError::MissingShipping)?;
        let payment = form.validate()?;

        let order = OrderIntent {
            lines: cart.lines().to_vec(),
            totals: self.totals(cart),
            shipping,
            payment_method: payment.method,
            placed_at: Utc::now(),
        };

        self.draft.payment = Some(payment);
        self.draft.is_done = true;
        self.persist();
        cart.clear_cart();

        info!(
            lines = order.lines.len(),
            grand_total = %order.totals.grand_total,
            payment_method = %order.payment_method,
            "Order placed"
        );
        add_breadcrumb("checkout", "Order placed", None);

        Ok(Completion {
            order,
            redirect: CheckoutStep::Complete.route(),
        })
    }

    fn persist(&self) {
        persist(self.storage.as_ref(), CHECKOUT_KEY, &self.draft);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::DateTime;
    use lumina_core::{Product, ProductId};

    fn product(id: &str, dollars: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            name_lower: id.to_string(),
            brand: "Acme".to_string(),
            price: Price::from_dollars(dollars),
            description: String::new(),
            image: String::new(),
            image_collection: vec![],
            category: String::new(),
            is_featured: false,
            is_recommended: false,
            available_colors: vec!["red".to_string()],
            available_sizes: vec!["M".to_string()],
            max_quantity: 5,
            keywords: vec![],
            date_added: DateTime::from_timestamp_millis(0).unwrap(),
        }
    }

    fn setup() -> (CartStore, CheckoutStore) {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::restore(Arc::clone(&storage));
        cart.add_item(CartLine::from_product(&product("p1", 20), 2, None, None))
            .unwrap();
        cart.add_item(CartLine::from_product(&product("p2", 15), 1, None, None))
            .unwrap();
        (cart, CheckoutStore::restore(storage, CheckoutConfig::default()))
    }

    fn shipping(is_international: bool) -> ShippingForm {
        ShippingForm {
            fullname: "Ana Cruz".to_string(),
            email: "ana@example.com".to_string(),
            address: "12 Rizal Ave".to_string(),
            mobile: "09171234567".to_string(),
            is_international,
        }
    }

    fn payment() -> PaymentForm {
        PaymentForm {
            method: PaymentMethod::CreditCard,
            name: "Ana Cruz".to_string(),
            card_number: "4111111111111111".to_string(),
            expiry: "12/29".to_string(),
            ccv: "123".to_string(),
        }
    }

    #[test]
    fn test_international_surcharge() {
        let (cart, mut checkout) = setup();
        assert_eq!(checkout.review(&cart).unwrap().grand_total, Price::from_dollars(55));

        let totals = checkout.submit_shipping(&cart, &shipping(true)).unwrap();
        assert_eq!(totals.subtotal, Price::from_dollars(55));
        assert_eq!(totals.shipping_fee, Price::from_dollars(50));
        assert_eq!(totals.grand_total, Price::from_dollars(105));
    }

    #[test]
    fn test_totals_follow_live_cart() {
        let (mut cart, mut checkout) = setup();
        checkout.submit_shipping(&cart, &shipping(false)).unwrap();
        cart.remove_item(&ProductId::new("p2"));
        assert_eq!(checkout.totals(&cart).grand_total, Price::from_dollars(40));
    }

    #[test]
    fn test_payment_step_without_shipping_redirects() {
        let (mut cart, mut checkout) = setup();
        assert_eq!(
            checkout.enter(CheckoutStep::Payment, &cart),
            StepGate::Redirect(CheckoutStep::Shipping)
        );
        assert!(matches!(
            checkout.submit_payment(&mut cart, &payment()),
            Err(AppError::MissingShipping)
        ));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_empty_cart_blocks_every_step() {
        let (mut cart, checkout) = setup();
        cart.clear_cart();
        assert_eq!(checkout.enter(CheckoutStep::Review, &cart), StepGate::EmptyCart);
        assert_eq!(checkout.enter(CheckoutStep::Shipping, &cart), StepGate::EmptyCart);
        assert!(matches!(checkout.review(&cart), Err(AppError::EmptyCart)));
    }

    #[test]
    fn test_invalid_payment_keeps_cart() {
        let (mut cart, mut checkout) = setup();
        checkout.submit_shipping(&cart, &shipping(false)).unwrap();
        let mut bad = payment();
        bad.ccv = String::new();
        assert!(matches!(
            checkout.submit_payment(&mut cart, &bad),
            Err(AppError::Validation(_))
        ));
        assert!(!cart.is_empty());
        assert!(!checkout.is_done());
    }

    #[test]
    fn test_completion_clears_cart_and_marks_done() {
        let (mut cart, mut checkout) = setup();
        checkout.submit_shipping(&cart, &shipping(true)).unwrap();
        assert_eq!(checkout.enter(CheckoutStep::Payment, &cart), StepGate::Ready);

        let completion = checkout.submit_payment(&mut cart, &payment()).unwrap();
        assert!(cart.is_empty());
        assert!(checkout.is_done());
        assert_eq!(completion.redirect, Route::Home);
        assert_eq!(completion.order.lines.len(), 2);
        assert_eq!(completion.order.totals.grand_total, Price::from_dollars(105));
        assert_eq!(checkout.current_step(&cart), CheckoutStep::Complete);
    }

    #[test]
    fn test_draft_survives_restore_and_reset() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let cart = {
            let mut cart = CartStore::restore(Arc::clone(&storage));
            cart.add_item(CartLine::from_product(&product("p1", 20), 1, None, None))
                .unwrap();
            cart
        };
        let mut checkout = CheckoutStore::restore(Arc::clone(&storage), CheckoutConfig::default());
        checkout.submit_shipping(&cart, &shipping(false)).unwrap();

        let mut restored = CheckoutStore::restore(Arc::clone(&storage), CheckoutConfig::default());
        assert_eq!(restored.draft(), checkout.draft());
        assert_eq!(restored.shipping_prefill(None).address, "12 Rizal Ave");

        restored.reset_checkout();
        let after_reset = CheckoutStore::restore(storage, CheckoutConfig::default());
        assert_eq!(after_reset.draft(), &CheckoutDraft::default());
    }
}
