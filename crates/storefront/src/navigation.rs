//! Page routes and their access rules.

use std::fmt;

use lumina_core::ProductId;

use crate::auth::AuthState;

/// Every page the storefront serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Shop,
    Search(String),
    Featured,
    Recommended,
    Product(ProductId),
    SignIn,
    SignUp,
    ForgotPassword,
    Account,
    AccountEdit,
    CheckoutStep1,
    CheckoutStep2,
    CheckoutStep3,
    AdminDashboard,
    AdminProducts,
    AdminAddProduct,
    AdminEditProduct(ProductId),
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone.
    Public,
    /// Only signed-out visitors; signed-in users go home.
    GuestOnly,
    /// Only signed-in users; others go to sign-in.
    Authenticated,
    /// Only `ADMIN` users.
    Admin,
}

/// What the router should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the page.
    Allow,
    /// Session state is still loading; show a preloader.
    Pending,
    /// Go here instead.
    Redirect(Route),
}

impl Route {
    /// The URL path.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Shop => "/shop".to_string(),
            Self::Search(key) => format!("/search/{key}"),
            Self::Featured => "/featured".to_string(),
            Self::Recommended => "/recommended".to_string(),
            Self::Product(id) => format!("/product/{id}"),
            Self::SignIn => "/signin".to_string(),
            Self::SignUp => "/signup".to_string(),
            Self::ForgotPassword => "/forgot-password".to_string(),
            Self::Account => "/account".to_string(),
            Self::AccountEdit => "/account/edit".to_string(),
            Self::CheckoutStep1 => "/checkout/step-1".to_string(),
            Self::CheckoutStep2 => "/checkout/step-2".to_string(),
            Self::CheckoutStep3 => "/checkout/step-3".to_string(),
            Self::AdminDashboard => "/admin/dashboard".to_string(),
            Self::AdminProducts => "/admin/products".to_string(),
            Self::AdminAddProduct => "/admin/products/add".to_string(),
            Self::AdminEditProduct(id) => format!("/admin/products/edit/{id}"),
        }
    }

    /// Match a URL path. Returns `None` for unknown paths (the not-found page).
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();
        let route = match segments.as_slice() {
            [] | [""] => Self::Home,
            ["shop"] => Self::Shop,
            ["search", key] if !key.is_empty() => Self::Search((*key).to_string()),
            ["featured"] => Self::Featured,
            ["recommended"] => Self::Recommended,
            ["product", id] if !id.is_empty() => Self::Product(ProductId::new(*id)),
            ["signin"] => Self::SignIn,
            ["signup"] => Self::SignUp,
            ["forgot-password"] => Self::ForgotPassword,
            ["account"] => Self::Account,
            ["account", "edit"] => Self::AccountEdit,
            ["checkout", "step-1"] => Self::CheckoutStep1,
            ["checkout", "step-2"] => Self::CheckoutStep2,
            ["checkout", "step-3"] => Self::CheckoutStep3,
            ["admin", "dashboard"] => Self::AdminDashboard,
            ["admin", "products"] => Self::AdminProducts,
            ["admin", "products", "add"] => Self::AdminAddProduct,
            ["admin", "products", "edit", id] if !id.is_empty() => {
                Self::AdminEditProduct(ProductId::new(*id))
            }
            _ => return None,
        };
        Some(route)
    }

    /// Access rule for this route.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::SignIn | Self::SignUp | Self::ForgotPassword => Access::GuestOnly,
            Self::Account
            | Self::AccountEdit
            | Self::CheckoutStep1
            | Self::CheckoutStep2
            | Self::CheckoutStep3 => Access::Authenticated,
            Self::AdminDashboard
            | Self::AdminProducts
            | Self::AdminAddProduct
            | Self::AdminEditProduct(_) => Access::Admin,
            Self::Home
            | Self::Shop
            | Self::Search(_)
            | Self::Featured
            | Self::Recommended
            | Self::Product(_) => Access::Public,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Decide whether the session in `auth` may open `route`.
#[must_use]
pub fn guard(route: &Route, auth: &AuthState) -> GuardDecision {
    let access = route.access();
    if access == Access::Public {
        return GuardDecision::Allow;
    }
    if auth.is_authenticating {
        return GuardDecision::Pending;
    }

    match access {
        Access::Public => GuardDecision::Allow,
        Access::GuestOnly if auth.is_authenticated => GuardDecision::Redirect(Route::Home),
        Access::GuestOnly => GuardDecision::Allow,
        Access::Authenticated | Access::Admin if !auth.is_authenticated => {
            GuardDecision::Redirect(Route::SignIn)
        }
        Access::Admin if !auth.user.as_ref().is_some_and(lumina_core::User::is_admin) => {
            GuardDecision::Redirect(Route::Home)
        }
        Access::Authenticated | Access::Admin => GuardDecision::Allow,
    }
}
