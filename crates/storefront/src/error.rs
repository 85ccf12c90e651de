//! Unified error handling with Sentry integration.
//!
//! Every store operation that can fail returns `Result<T, AppError>`. The
//! surface showing the failure calls [`AppError::user_message`] for the text
//! it displays and [`AppError::capture`] to report backend-class failures.

use lumina_core::ValidationErrors;
use thiserror::Error;

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Message shown for any failure the shopper cannot act on.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog read or write failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Identity provider or profile store failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Device-local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A submitted form failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not signed in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is signed in but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Checkout was attempted with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Payment was submitted before shipping details were saved.
    #[error("Shipping details missing")]
    MissingShipping,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure is on our side rather than the shopper's.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Catalog(err) => !matches!(err, CatalogError::NotFound(_)),
            Self::Auth(err) => err.is_server_error(),
            Self::Storage(_) | Self::Internal(_) => true,
            _ => false,
        }
    }

    /// Text to show the shopper. Never exposes internal details.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) => {
                "We couldn't find that product.".to_string()
            }
            Self::Catalog(_) | Self::Storage(_) | Self::Internal(_) => GENERIC_MESSAGE.to_string(),
            Self::Auth(err) => err.user_message(),
            Self::Validation(_) => "Please correct the highlighted fields.".to_string(),
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::Unauthorized(_) => "Please sign in to continue.".to_string(),
            Self::Forbidden(_) => "You don't have access to this page.".to_string(),
            Self::EmptyCart => "Your cart is empty.".to_string(),
            Self::MissingShipping => "Please enter your shipping details first.".to_string(),
        }
    }

    /// Report server-class failures to Sentry.
    ///
    /// Returns the Sentry event id when the error was captured.
    pub fn capture(&self) -> Option<sentry::types::Uuid> {
        if !self.is_server_error() {
            return None;
        }
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Storefront error"
        );
        Some(event_id)
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "p-123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
