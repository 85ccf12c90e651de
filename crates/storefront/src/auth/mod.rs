//! Authentication store.
//!
//! Wraps an external [`IdentityProvider`] and caches the signed-in user's
//! profile for the session. `{ user, is_authenticated }` is persisted under
//! [`AUTH_KEY`] so a restart restores the signed-in view; the in-flight flag
//! and the last error are session-only.

mod error;
pub mod firebase;
pub mod forms;
mod memory;

pub use error::AuthError;
pub use firebase::FirebaseIdentity;
pub use forms::{Credentials, ProfileForm, Registration, SignInForm, SignUpForm};
pub use memory::MemoryIdentity;

use std::sync::Arc;

use async_trait::async_trait;
use lumina_core::{Email, ProfileUpdate, User, UserId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::CheckoutConfig;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::storage::{AUTH_KEY, LocalStorage, load_snapshot, persist};

/// Boundary to the external identity provider and profile store.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and return the stored profile.
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError>;

    /// Create an account and its profile (role `USER`).
    async fn sign_up(&self, registration: &Registration) -> Result<User, AuthError>;

    /// End the provider session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Send a password reset email.
    async fn reset_password(&self, email: &Email) -> Result<(), AuthError>;

    /// Load the profile for `id`.
    async fn fetch_profile(&self, id: &UserId) -> Result<User, AuthError>;

    /// Write the set fields of `update` to the profile for `id`.
    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<(), AuthError>;
}

/// Read-only view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_authenticating: bool,
    pub auth_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    user: Option<User>,
    is_authenticated: bool,
}

/// The auth state container.
pub struct AuthStore {
    state: AuthState,
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Load the persisted session, or start signed out.
    #[must_use]
    pub fn restore(provider: Arc<dyn IdentityProvider>, storage: Arc<dyn LocalStorage>) -> Self {
        let session: Option<PersistedSession> = load_snapshot(storage.as_ref(), AUTH_KEY);
        let state = session.map_or_else(AuthState::default, |s| AuthState {
            is_authenticated: s.is_authenticated && s.user.is_some(),
            user: s.user,
            is_authenticating: false,
            auth_error: None,
        });
        if let Some(user) = &state.user {
            set_sentry_user(&user.id, Some(user.email.as_str()));
        }
        Self {
            state,
            provider,
            storage,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AuthState {
        &self.state
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a malformed form, or the
    /// provider's error. The message is also recorded in `auth_error`.
    #[instrument(skip(self, form), fields(email = %form.email.trim()))]
    pub async fn sign_in(&mut self, form: &SignInForm) -> Result<User, AuthError> {
        self.begin();
        let result = match form.validate() {
            Ok(credentials) => self.provider.sign_in(&credentials).await,
            Err(errors) => Err(errors.into()),
        };
        self.finish_session(result)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a malformed form, or the
    /// provider's error. The message is also recorded in `auth_error`.
    #[instrument(skip(self, form), fields(email = %form.email.trim()))]
    pub async fn sign_up(&mut self, form: &SignUpForm) -> Result<User, AuthError> {
        self.begin();
        let result = match form.validate() {
            Ok(registration) => self.provider.sign_up(&registration).await,
            Err(errors) => Err(errors.into()),
        };
        self.finish_session(result)
    }

    /// Sign out and forget the cached profile.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the session is kept in that case.
    #[instrument(skip(self))]
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        if let Err(err) = self.provider.sign_out().await {
            return Err(self.record(err));
        }
        self.state.user = None;
        self.state.is_authenticated = false;
        self.state.auth_error = None;
        self.persist();
        clear_sentry_user();
        add_breadcrumb("auth", "Signed out", None);
        info!("Signed out");
        Ok(())
    }

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a malformed address, or the
    /// provider's error. The message is also recorded in `auth_error`.
    #[instrument(skip(self))]
    pub async fn reset_password(&mut self, email: &str) -> Result<(), AuthError> {
        let email = match Email::parse(email.trim()) {
            Ok(email) => email,
            Err(_) => {
                let mut errors = lumina_core::ValidationErrors::new();
                errors.add("email", "Invalid email address");
                return Err(self.record(errors.into()));
            }
        };
        match self.provider.reset_password(&email).await {
            Ok(()) => {
                info!(email = %email, "Password reset email sent");
                Ok(())
            }
            Err(err) => Err(self.record(err)),
        }
    }

    /// Re-read the signed-in user's profile from the provider.
    ///
    /// Used on startup to confirm a restored session is still valid.
    ///
    /// # Errors
    ///
    /// Returns the provider's error. A missing profile signs the user out
    /// locally.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<Option<User>, AuthError> {
        let Some(id) = self.state.user.as_ref().map(|u| u.id.clone()) else {
            self.set_authenticating(false);
            return Ok(None);
        };
        self.set_authenticating(true);
        match self.provider.fetch_profile(&id).await {
            Ok(user) => {
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(AuthError::ProfileNotFound) => {
                self.set_user(None);
                Err(self.record(AuthError::ProfileNotFound))
            }
            Err(err) => {
                self.state.is_authenticating = false;
                Err(self.record(err))
            }
        }
    }

    // =========================================================================
    // Direct setters
    // =========================================================================

    /// Replace the cached user, e.g. from a provider session listener.
    pub fn set_user(&mut self, user: Option<User>) {
        match &user {
            Some(user) => set_sentry_user(&user.id, Some(user.email.as_str())),
            None => clear_sentry_user(),
        }
        self.state.is_authenticated = user.is_some();
        self.state.user = user;
        self.state.is_authenticating = false;
        self.persist();
    }

    pub const fn set_authenticating(&mut self, is_authenticating: bool) {
        self.state.is_authenticating = is_authenticating;
    }

    pub fn clear_error(&mut self) {
        self.state.auth_error = None;
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Validate `form` and write it to the signed-in user's profile.
    ///
    /// The cached user is merged with the update only after the provider
    /// accepts it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` with no signed-in user,
    /// `AuthError::Validation` for a malformed form, or the provider's error.
    #[instrument(skip(self, form, config))]
    pub async fn update_profile(
        &mut self,
        form: &ProfileForm,
        config: &CheckoutConfig,
    ) -> Result<User, AuthError> {
        let Some(id) = self.state.user.as_ref().map(|u| u.id.clone()) else {
            return Err(self.record(AuthError::NotAuthenticated));
        };
        let update = match form.validate(config) {
            Ok(update) => update,
            Err(errors) => return Err(self.record(errors.into())),
        };
        self.apply_update(&id, &update).await
    }

    /// Write an already-built partial update (e.g. a new avatar reference).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` with no signed-in user, or the
    /// provider's error.
    pub async fn update_profile_fields(&mut self, update: &ProfileUpdate) -> Result<User, AuthError> {
        let Some(id) = self.state.user.as_ref().map(|u| u.id.clone()) else {
            return Err(self.record(AuthError::NotAuthenticated));
        };
        self.apply_update(&id, update).await
    }

    async fn apply_update(&mut self, id: &UserId, update: &ProfileUpdate) -> Result<User, AuthError> {
        if let Err(err) = self.provider.update_profile(id, update).await {
            return Err(self.record(err));
        }
        let Some(user) = self.state.user.as_mut() else {
            return Err(self.record(AuthError::NotAuthenticated));
        };
        update.apply_to(user);
        let user = user.clone();
        self.persist();
        add_breadcrumb("auth", "Profile updated", Some(&[("user_id", id.as_str())]));
        info!(user_id = %id, fields = ?update.field_paths(), "Profile updated");
        Ok(user)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn begin(&mut self) {
        self.state.is_authenticating = true;
        self.state.auth_error = None;
    }

    fn finish_session(&mut self, result: Result<User, AuthError>) -> Result<User, AuthError> {
        self.state.is_authenticating = false;
        match result {
            Ok(user) => {
                add_breadcrumb("auth", "Signed in", Some(&[("user_id", user.id.as_str())]));
                info!(user_id = %user.id, "Signed in");
                self.set_user(Some(user.clone()));
                Ok(user)
            }
            Err(err) => Err(self.record(err)),
        }
    }

    fn record(&mut self, err: AuthError) -> AuthError {
        if err.is_server_error() {
            tracing::error!(error = %err, "Identity provider failure");
        }
        self.state.auth_error = Some(err.user_message());
        err
    }

    fn persist(&self) {
        persist(
            self.storage.as_ref(),
            AUTH_KEY,
            &PersistedSession {
                user: self.state.user.clone(),
                is_authenticated: self.state.is_authenticated,
            },
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use lumina_core::UserRole;
    use secrecy::SecretString;

    fn store(identity: &Arc<MemoryIdentity>, storage: &Arc<MemoryStorage>) -> AuthStore {
        let provider: Arc<dyn IdentityProvider> = identity.clone();
        let storage: Arc<dyn LocalStorage> = storage.clone();
        AuthStore::restore(provider, storage)
    }

    fn sign_in_form(password: &str) -> SignInForm {
        SignInForm {
            email: "ana@example.com".to_string(),
            password: SecretString::from(password),
        }
    }

    fn identity() -> Arc<MemoryIdentity> {
        let identity = MemoryIdentity::new();
        identity.add_account("ana@example.com", "hunter22", "Ana Cruz", UserRole::User);
        Arc::new(identity)
    }

    #[tokio::test]
    async fn test_sign_in_sets_user_and_persists() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);

        let user = auth.sign_in(&sign_in_form("hunter22")).await.unwrap();
        assert_eq!(user.fullname, "Ana Cruz");
        assert!(auth.is_authenticated());
        assert!(!auth.state().is_authenticating);

        let restored = store(&identity, &storage);
        assert_eq!(restored.user().map(|u| u.id.clone()), Some(user.id));
        assert!(restored.is_authenticated());
    }

    #[tokio::test]
    async fn test_wrong_password_records_error() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);

        let err = auth.sign_in(&sign_in_form("wrong-pass")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(
            auth.state().auth_error.as_deref(),
            Some("Incorrect email or password.")
        );
        assert!(!auth.is_authenticated());
        assert!(!auth.state().is_authenticating);

        auth.clear_error();
        assert!(auth.state().auth_error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_provider() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);

        let err = auth.sign_in(&sign_in_form("123")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(identity.sign_in_attempts(), 0);
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_out() {
        let identity = Arc::new(MemoryIdentity::new());
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);

        let form = SignUpForm {
            fullname: "Bo Reyes".to_string(),
            email: "bo@example.com".to_string(),
            password: SecretString::from("secret1"),
            confirm_password: SecretString::from("secret1"),
        };
        let user = auth.sign_up(&form).await.unwrap();
        assert_eq!(user.role, UserRole::User);

        let duplicate = auth.sign_up(&form).await.unwrap_err();
        assert!(matches!(duplicate, AuthError::EmailAlreadyInUse));

        auth.sign_out().await.unwrap();
        assert!(auth.user().is_none());
        assert!(!auth.is_authenticated());
        assert!(auth.state().auth_error.is_none());

        let restored = store(&identity, &storage);
        assert!(!restored.is_authenticated());
    }

    #[tokio::test]
    async fn test_update_profile_requires_user() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);

        let form = ProfileForm {
            fullname: "Ana M. Cruz".to_string(),
            email: "ana@example.com".to_string(),
            ..ProfileForm::default()
        };
        let err = auth
            .update_profile(&form, &CheckoutConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));
        assert_eq!(auth.state().auth_error.as_deref(), Some("No authenticated user"));
    }

    #[tokio::test]
    async fn test_update_profile_merges_into_cached_user() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);
        auth.sign_in(&sign_in_form("hunter22")).await.unwrap();

        let form = ProfileForm {
            fullname: "Ana M. Cruz".to_string(),
            email: "ana@example.com".to_string(),
            address: "12 Rizal Ave".to_string(),
            mobile: "0917 123 4567".to_string(),
            ..ProfileForm::default()
        };
        let user = auth
            .update_profile(&form, &CheckoutConfig::default())
            .await
            .unwrap();
        assert_eq!(user.fullname, "Ana M. Cruz");
        assert_eq!(user.mobile.as_ref().map(|m| m.dial_code.as_str()), Some("+63"));

        let stored = identity.fetch_profile(&user.id).await.unwrap();
        assert_eq!(stored.address, user.address);
    }

    #[tokio::test]
    async fn test_refresh_drops_deleted_profile() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);
        let user = auth.sign_in(&sign_in_form("hunter22")).await.unwrap();

        identity.remove_profile(&user.id);
        let err = auth.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::ProfileNotFound));
        assert!(!auth.is_authenticated());
        assert!(!auth.state().is_authenticating);
    }

    #[tokio::test]
    async fn test_reset_password_validates_email() {
        let identity = identity();
        let storage = Arc::new(MemoryStorage::new());
        let mut auth = store(&identity, &storage);

        assert!(auth.reset_password("nope").await.is_err());
        assert!(auth.state().auth_error.is_some());
        auth.reset_password("ana@example.com").await.unwrap();
        assert_eq!(identity.reset_requests(), vec!["ana@example.com".to_string()]);
    }
}
