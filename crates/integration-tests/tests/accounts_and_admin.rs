//! Integration tests for sessions, route guards and the admin catalog.

#![allow(clippy::unwrap_used)]

use lumina_core::ProductId;
use lumina_integration_tests::{ADMIN_EMAIL, Harness, PASSWORD, SHOPPER_EMAIL};
use lumina_storefront::admin::ProductForm;
use lumina_storefront::auth::{AuthError, SignInForm, SignUpForm};
use lumina_storefront::error::AppError;
use lumina_storefront::navigation::{GuardDecision, Route};
use rust_decimal::Decimal;
use secrecy::SecretString;

fn product_form(name: &str) -> ProductForm {
    ProductForm {
        name: name.to_string(),
        brand: "Salt".to_string(),
        price: Decimal::new(4500, 2),
        category: "Tops".to_string(),
        max_quantity: 5,
        description: "Breathable linen for hot days.".to_string(),
        keywords: vec!["Linen".to_string(), "shirt".to_string()],
        available_colors: vec!["#ffffff".to_string()],
        available_sizes: vec!["S".to_string(), "M".to_string()],
        image: Some("products/linen.jpg".to_string()),
        ..ProductForm::default()
    }
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_sign_in_persists_across_restart() {
    let mut harness = Harness::new();
    harness.sign_in(SHOPPER_EMAIL).await.unwrap();

    let restarted = harness.restart();

    assert!(restarted.auth.is_authenticated());
    assert_eq!(restarted.auth.user().unwrap().fullname, "Ana Cruz");
}

#[tokio::test]
async fn test_wrong_password_is_recorded() {
    let mut harness = Harness::new();
    let form = SignInForm {
        email: SHOPPER_EMAIL.to_string(),
        password: SecretString::from("not-the-one"),
    };

    let err = harness.shop.auth.sign_in(&form).await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    let state = harness.shop.auth.state();
    assert!(!state.is_authenticated);
    assert!(!state.is_authenticating);
    assert!(state.auth_error.is_some());
}

#[tokio::test]
async fn test_mismatched_passwords_never_reach_the_provider() {
    let mut harness = Harness::new();
    let form = SignUpForm {
        fullname: "Ben Reyes".to_string(),
        email: "ben@example.com".to_string(),
        password: SecretString::from(PASSWORD),
        confirm_password: SecretString::from("something-else"),
    };

    let err = harness.shop.auth.sign_up(&form).await.unwrap_err();

    let AuthError::Validation(errors) = err else {
        panic!("expected validation errors, got {err:?}");
    };
    assert_eq!(errors.message_for("confirmPassword"), Some("Passwords don't match"));

    let sign_in = SignInForm {
        email: "ben@example.com".to_string(),
        password: SecretString::from(PASSWORD),
    };
    let err = harness.shop.auth.sign_in(&sign_in).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_sign_up_then_sign_out() {
    let mut harness = Harness::new();
    let form = SignUpForm {
        fullname: "Ben Reyes".to_string(),
        email: "ben@example.com".to_string(),
        password: SecretString::from(PASSWORD),
        confirm_password: SecretString::from(PASSWORD),
    };

    let user = harness.shop.auth.sign_up(&form).await.unwrap();
    assert!(!user.is_admin());
    assert!(harness.shop.auth.is_authenticated());

    harness.shop.auth.sign_out().await.unwrap();
    assert!(!harness.restart().auth.is_authenticated());
}

#[tokio::test]
async fn test_reset_password_reaches_provider() {
    let mut harness = Harness::new();

    harness.shop.auth.reset_password(" ana@example.com ").await.unwrap();
    let err = harness.shop.auth.reset_password("not-an-email").await.unwrap_err();

    assert!(matches!(err, AuthError::Validation(_)));
    assert_eq!(harness.identity.reset_requests(), [SHOPPER_EMAIL]);
}

// =============================================================================
// Route Guards
// =============================================================================

#[tokio::test]
async fn test_guards_follow_the_session() {
    let mut harness = Harness::new();
    let account = Route::from_path("/account").unwrap();
    let signin = Route::from_path("/signin").unwrap();

    assert_eq!(harness.shop.guard(&account), GuardDecision::Redirect(Route::SignIn));
    assert_eq!(harness.shop.guard(&signin), GuardDecision::Allow);

    harness.sign_in(SHOPPER_EMAIL).await.unwrap();

    assert_eq!(harness.shop.guard(&account), GuardDecision::Allow);
    assert_eq!(harness.shop.guard(&signin), GuardDecision::Redirect(Route::Home));
    assert_eq!(
        harness.shop.guard(&Route::AdminDashboard),
        GuardDecision::Redirect(Route::Home)
    );
}

#[tokio::test]
async fn test_guards_wait_while_authenticating() {
    let mut harness = Harness::new();
    harness.shop.auth.set_authenticating(true);

    assert_eq!(harness.shop.guard(&Route::Account), GuardDecision::Pending);
    assert_eq!(harness.shop.guard(&Route::Shop), GuardDecision::Allow);
}

// =============================================================================
// Admin Catalog
// =============================================================================

#[tokio::test]
async fn test_admin_writes_need_an_admin() {
    let mut harness = Harness::new();
    let form = product_form("Linen Shirt II");

    let err = harness
        .shop
        .admin()
        .create(harness.shop.auth.state(), &form)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    harness.sign_in(SHOPPER_EMAIL).await.unwrap();
    let err = harness
        .shop
        .admin()
        .delete(harness.shop.auth.state(), &ProductId::new("P1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(harness.catalog.snapshot().len(), 5);
}

#[tokio::test]
async fn test_admin_created_product_is_searchable() {
    let mut harness = Harness::new();
    harness.sign_in(ADMIN_EMAIL).await.unwrap();
    // Warm the search cache before the write.
    let before = harness.shop.catalog().search_products("cotton").await.unwrap();
    assert!(before.is_empty());

    let created = harness
        .shop
        .admin()
        .create(harness.shop.auth.state(), &product_form("Cotton Tee"))
        .await
        .unwrap();

    assert_eq!(created.name_lower, "cotton tee");
    assert_eq!(created.keywords, ["linen", "shirt"]);
    let after = harness.shop.catalog().search_products("cotton").await.unwrap();
    assert_eq!(after.first().map(|p| &p.id), Some(&created.id));
}

#[tokio::test]
async fn test_admin_update_keeps_image_and_delete_removes() {
    let mut harness = Harness::new();
    harness.sign_in(ADMIN_EMAIL).await.unwrap();
    let id = ProductId::new("P3");

    let mut form = product_form("Wool Coat");
    form.image = None;
    form.is_featured = true;
    let updated = harness
        .shop
        .admin()
        .update(harness.shop.auth.state(), &id, &form)
        .await
        .unwrap();
    assert_eq!(updated.image, "products/P3.jpg");
    assert!(updated.is_featured);

    let summary = harness.shop.admin().dashboard(harness.shop.auth.state()).await.unwrap();
    assert_eq!(summary.total_products, 5);
    assert_eq!(summary.featured, 2);

    harness.shop.admin().delete(harness.shop.auth.state(), &id).await.unwrap();
    let err = harness.shop.catalog().get_product(&id).await.unwrap_err();
    assert!(matches!(err, lumina_storefront::catalog::CatalogError::NotFound(_)));
}
