//! Firebase Identity Toolkit provider.
//!
//! Credentials are checked with the Identity Toolkit REST API; profiles live
//! in the Firestore `users` collection, one document per user id. A
//! successful sign-in hands the ID token to the shared [`FirestoreClient`]
//! so later reads and writes run as the signed-in user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lumina_core::{Email, ProfileUpdate, User, UserId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::{AuthError, Credentials, IdentityProvider, Registration};
use crate::config::FirebaseConfig;
use crate::firestore::{FirestoreClient, FirestoreError};

const IDENTITY_HOST: &str = "https://identitytoolkit.googleapis.com/v1";

/// Collection holding user profiles.
pub const USERS_COLLECTION: &str = "users";

/// Fields of an Identity Toolkit sign-in/sign-up response we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
}

/// Identity provider backed by Firebase Authentication.
#[derive(Clone)]
pub struct FirebaseIdentity {
    inner: Arc<FirebaseIdentityInner>,
}

struct FirebaseIdentityInner {
    client: reqwest::Client,
    api_key: SecretString,
    firestore: FirestoreClient,
}

impl std::fmt::Debug for FirebaseIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentity")
            .field("firestore", &self.inner.firestore)
            .finish_non_exhaustive()
    }
}

impl FirebaseIdentity {
    /// Create a provider sharing `firestore`'s session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &FirebaseConfig,
        firestore: FirestoreClient,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            inner: Arc::new(FirebaseIdentityInner {
                client,
                api_key: config.api_key.clone(),
                firestore,
            }),
        })
    }

    /// POST to an `accounts:*` endpoint and return the JSON body.
    async fn call(&self, method: &str, body: &Value) -> Result<Value, AuthError> {
        let url = format!("{IDENTITY_HOST}/accounts:{method}");
        let response = self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AuthError::TooManyAttempts);
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            let code = serde_json::from_str::<Value>(&response_text)
                .ok()
                .and_then(|body| {
                    body.pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                });
            let Some(code) = code else {
                tracing::error!(
                    status = %status,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Identity Toolkit returned non-success status"
                );
                return Err(AuthError::Provider(format!("HTTP {status}")));
            };
            debug!(method, code = %code, "Identity Toolkit rejected request");
            return Err(AuthError::from_provider_code(&code));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Identity Toolkit response"
            );
            AuthError::Provider(format!("unreadable response: {e}"))
        })
    }

    async fn exchange(
        &self,
        method: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<TokenResponse, AuthError> {
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "returnSecureToken": true,
        });
        let raw = self.call(method, &body).await?;
        let tokens: TokenResponse = serde_json::from_value(raw)
            .map_err(|e| AuthError::Provider(format!("unexpected token response: {e}")))?;
        self.inner
            .firestore
            .set_id_token(Some(SecretString::from(tokens.id_token.clone())));
        Ok(tokens)
    }
}

fn to_fields<T: serde::Serialize>(value: &T) -> Result<Map<String, Value>, AuthError> {
    match serde_json::to_value(value).map_err(FirestoreError::from)? {
        Value::Object(map) => Ok(map),
        _ => Err(AuthError::Provider("profile did not serialize to a map".to_string())),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let tokens = self
            .exchange("signInWithPassword", &credentials.email, &credentials.password)
            .await?;
        self.fetch_profile(&UserId::new(tokens.local_id)).await
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn sign_up(&self, registration: &Registration) -> Result<User, AuthError> {
        let tokens = self
            .exchange("signUp", &registration.email, &registration.password)
            .await?;
        let user = User {
            id: UserId::new(tokens.local_id),
            email: registration.email.clone(),
            fullname: registration.fullname.clone(),
            avatar: None,
            banner: None,
            address: None,
            mobile: None,
            role: UserRole::User,
            date_joined: Utc::now(),
        };
        self.inner
            .firestore
            .create_document(USERS_COLLECTION, user.id.as_str(), &to_fields(&user)?)
            .await?;
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.firestore.set_id_token(None);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_password(&self, email: &Email) -> Result<(), AuthError> {
        let body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email.as_str(),
        });
        self.call("sendOobCode", &body).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn fetch_profile(&self, id: &UserId) -> Result<User, AuthError> {
        let document = self
            .inner
            .firestore
            .get_document(USERS_COLLECTION, id.as_str())
            .await?
            .ok_or(AuthError::ProfileNotFound)?;
        Ok(document.into_record()?)
    }

    #[instrument(skip(self, update), fields(user_id = %id))]
    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<(), AuthError> {
        if update.is_empty() {
            return Ok(());
        }
        let mask = update.field_paths();
        match self
            .inner
            .firestore
            .patch_document(USERS_COLLECTION, id.as_str(), &to_fields(update)?, Some(mask.as_slice()))
            .await
        {
            Ok(()) => Ok(()),
            Err(FirestoreError::Status { status: 404, .. }) => Err(AuthError::ProfileNotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lumina_core::Address;

    #[test]
    fn test_profile_fields_use_document_names() {
        let user = User {
            id: UserId::new("u1"),
            email: Email::parse("ana@example.com").unwrap(),
            fullname: "Ana Cruz".to_string(),
            avatar: None,
            banner: None,
            address: None,
            mobile: None,
            role: UserRole::User,
            date_joined: chrono::DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
        };
        let fields = to_fields(&user).unwrap();
        assert_eq!(fields.get("role"), Some(&json!("USER")));
        assert_eq!(fields.get("dateJoined"), Some(&json!(1_700_000_000_000_i64)));
        assert!(!fields.contains_key("avatar"));
    }

    #[test]
    fn test_update_fields_match_mask() {
        let update = ProfileUpdate {
            fullname: Some("Ana M. Cruz".to_string()),
            address: Some(Address {
                address: "12 Rizal Ave".to_string(),
                is_international: false,
            }),
            ..ProfileUpdate::default()
        };
        let fields = to_fields(&update).unwrap();
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut mask = update.field_paths();
        mask.sort_unstable();
        assert_eq!(keys, mask);
    }

    #[test]
    fn test_token_response_shape() {
        let raw = json!({
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "abc123",
            "email": "ana@example.com",
            "idToken": "token",
            "refreshToken": "refresh",
            "expiresIn": "3600"
        });
        let tokens: TokenResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(tokens.local_id, "abc123");
    }
}
