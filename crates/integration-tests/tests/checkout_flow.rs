//! Integration tests for the three-step checkout.

#![allow(clippy::unwrap_used)]

use lumina_core::{Price, ProductId};
use lumina_integration_tests::{Harness, SHOPPER_EMAIL, payment_form, shipping_form};
use lumina_storefront::cart::CartLine;
use lumina_storefront::checkout::{CheckoutStep, StepGate};
use lumina_storefront::error::AppError;
use lumina_storefront::navigation::{GuardDecision, Route};

async fn fill_cart(harness: &mut Harness) {
    for (id, quantity) in [("P1", 2), ("P2", 1)] {
        let product = harness
            .shop
            .catalog()
            .get_product(&ProductId::new(id))
            .await
            .unwrap();
        let line = CartLine::from_product(&product, quantity, None, None);
        harness.shop.cart.add_item(line).unwrap();
    }
}

// =============================================================================
// Totals
// =============================================================================

#[tokio::test]
async fn test_totals_with_and_without_international_fee() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();
    fill_cart(&mut harness).await;

    let review = harness.shop.checkout.review(&harness.shop.cart).unwrap();
    assert_eq!(review.subtotal, Price::from_dollars(55));
    assert_eq!(review.grand_total, Price::from_dollars(55));

    let totals = harness.shop.submit_shipping(&shipping_form(true)).unwrap();
    assert_eq!(totals.subtotal, Price::from_dollars(55));
    assert_eq!(totals.shipping_fee, Price::from_dollars(50));
    assert_eq!(totals.grand_total, Price::from_dollars(105));
}

// =============================================================================
// Full Flow
// =============================================================================

#[tokio::test]
async fn test_signed_in_checkout_completes() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();
    fill_cart(&mut harness).await;

    assert_eq!(
        harness.shop.enter_checkout(CheckoutStep::Review),
        Ok(StepGate::Ready)
    );
    harness.shop.checkout.review(&harness.shop.cart).unwrap();

    let prefill = harness.shop.shipping_form();
    assert_eq!(prefill.email, SHOPPER_EMAIL);
    harness.shop.submit_shipping(&shipping_form(false)).unwrap();

    assert_eq!(
        harness.shop.enter_checkout(CheckoutStep::Payment),
        Ok(StepGate::Ready)
    );
    let completion = harness.shop.place_order(&payment_form()).unwrap();

    assert_eq!(completion.redirect, Route::Home);
    assert_eq!(completion.order.lines.len(), 2);
    assert_eq!(completion.order.totals.grand_total, Price::from_dollars(55));
    assert!(harness.shop.cart.is_empty());
    assert!(harness.shop.checkout.is_done());
    assert_eq!(
        harness.shop.checkout.current_step(&harness.shop.cart),
        CheckoutStep::Complete
    );
}

#[tokio::test]
async fn test_completed_checkout_survives_restart() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();
    fill_cart(&mut harness).await;
    harness.shop.submit_shipping(&shipping_form(false)).unwrap();
    harness.shop.place_order(&payment_form()).unwrap();

    let restarted = harness.restart();

    assert!(restarted.cart.is_empty());
    assert!(restarted.checkout.is_done());
    assert!(restarted.auth.is_authenticated());
}

// =============================================================================
// Guards
// =============================================================================

#[tokio::test]
async fn test_signed_out_shopper_is_sent_to_sign_in() {
    let mut harness = Harness::new();
    fill_cart(&mut harness).await;

    assert_eq!(
        harness.shop.enter_checkout(CheckoutStep::Shipping),
        Err(GuardDecision::Redirect(Route::SignIn))
    );
    let err = harness.shop.place_order(&payment_form()).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(harness.shop.cart.item_count(), 3);
}

#[tokio::test]
async fn test_empty_cart_blocks_every_step() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();

    for step in [CheckoutStep::Review, CheckoutStep::Shipping, CheckoutStep::Payment] {
        assert_eq!(harness.shop.enter_checkout(step), Ok(StepGate::EmptyCart));
    }
    let err = harness.shop.submit_shipping(&shipping_form(false)).unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));
}

#[tokio::test]
async fn test_payment_before_shipping_redirects_to_step_two() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();
    fill_cart(&mut harness).await;

    assert_eq!(
        harness.shop.enter_checkout(CheckoutStep::Payment),
        Ok(StepGate::Redirect(CheckoutStep::Shipping))
    );
    let err = harness.shop.place_order(&payment_form()).unwrap_err();
    assert!(matches!(err, AppError::MissingShipping));
}

#[tokio::test]
async fn test_invalid_payment_keeps_cart() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();
    fill_cart(&mut harness).await;
    harness.shop.submit_shipping(&shipping_form(false)).unwrap();

    let mut form = payment_form();
    form.card_number = "4111".to_string();
    form.ccv = String::new();
    let err = harness.shop.place_order(&form).unwrap_err();

    let AppError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert!(errors.has("cardnumber"));
    assert!(errors.has("ccv"));
    assert!(!harness.shop.cart.is_empty());
    assert!(!harness.shop.checkout.is_done());
}
