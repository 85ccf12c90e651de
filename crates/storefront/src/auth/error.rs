//! Authentication error types.

use lumina_core::ValidationErrors;
use thiserror::Error;

use crate::firestore::FirestoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A sign-in, sign-up or profile form failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already uses this email.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// The provider rejected the password.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The account exists but has been disabled.
    #[error("user disabled")]
    UserDisabled,

    /// The provider is throttling attempts.
    #[error("too many attempts")]
    TooManyAttempts,

    /// The identity exists but has no profile document.
    #[error("User profile not found")]
    ProfileNotFound,

    /// The operation needs a signed-in user.
    #[error("No authenticated user")]
    NotAuthenticated,

    /// The identity provider answered with an error we don't map.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Profile store error.
    #[error("profile store error: {0}")]
    Profile(#[from] FirestoreError),
}

impl AuthError {
    /// Map an Identity Toolkit error code (e.g. `EMAIL_EXISTS`).
    ///
    /// Codes may carry a suffix such as `WEAK_PASSWORD : Password should be
    /// at least 6 characters`.
    #[must_use]
    pub fn from_provider_code(message: &str) -> Self {
        let (code, detail) = message
            .split_once(" : ")
            .map_or((message.trim(), ""), |(code, detail)| (code.trim(), detail.trim()));
        match code {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::InvalidCredentials
            }
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "WEAK_PASSWORD" => Self::WeakPassword(if detail.is_empty() {
                "Password should be at least 6 characters".to_string()
            } else {
                detail.to_string()
            }),
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            _ => Self::Provider(message.to_string()),
        }
    }

    /// Whether this failure is on our side rather than the shopper's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Provider(_) | Self::Http(_) | Self::Profile(_))
    }

    /// Text recorded in the auth store and shown to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors
                .errors()
                .first()
                .map_or_else(|| "Please check the form.".to_string(), |e| e.message.clone()),
            Self::InvalidCredentials => "Incorrect email or password.".to_string(),
            Self::EmailAlreadyInUse => "An account with this email already exists.".to_string(),
            Self::WeakPassword(message) => message.clone(),
            Self::UserDisabled => "This account has been disabled.".to_string(),
            Self::TooManyAttempts => "Too many attempts. Please try again later.".to_string(),
            Self::ProfileNotFound | Self::NotAuthenticated => self.to_string(),
            Self::Provider(_) | Self::Http(_) | Self::Profile(_) => {
                crate::error::GENERIC_MESSAGE.to_string()
            }
        }
    }
}
