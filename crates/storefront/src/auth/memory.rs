//! In-process identity provider for tests and offline runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use lumina_core::{Email, ProfileUpdate, User, UserId, UserRole};
use secrecy::ExposeSecret;

use super::{AuthError, Credentials, IdentityProvider, Registration};

#[derive(Debug, Default)]
struct Accounts {
    passwords: HashMap<String, (UserId, String)>,
    profiles: HashMap<UserId, User>,
    sign_in_attempts: usize,
    reset_requests: Vec<String>,
}

/// Accounts and profiles held in memory.
///
/// Passwords are compared in plain text; never use this against real users.
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    accounts: Mutex<Accounts>,
}

impl MemoryIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an account with a profile. Malformed emails are skipped.
    pub fn add_account(
        &self,
        email: &str,
        password: &str,
        fullname: &str,
        role: UserRole,
    ) -> Option<UserId> {
        let email = Email::parse(email).ok()?;
        let id = UserId::generate();
        let user = User {
            id: id.clone(),
            email: email.clone(),
            fullname: fullname.to_string(),
            avatar: None,
            banner: None,
            address: None,
            mobile: None,
            role,
            date_joined: Utc::now(),
        };
        self.insert(user, password);
        Some(id)
    }

    /// Seed an account from a full profile.
    pub fn insert(&self, user: User, password: &str) {
        let mut accounts = self.accounts();
        accounts.passwords.insert(
            user.email.as_str().to_string(),
            (user.id.clone(), password.to_string()),
        );
        accounts.profiles.insert(user.id.clone(), user);
    }

    /// Delete a profile while keeping its credentials.
    pub fn remove_profile(&self, id: &UserId) {
        self.accounts().profiles.remove(id);
    }

    /// Number of credential checks that reached this provider.
    #[must_use]
    pub fn sign_in_attempts(&self) -> usize {
        self.accounts().sign_in_attempts
    }

    /// Addresses that asked for a password reset, oldest first.
    #[must_use]
    pub fn reset_requests(&self) -> Vec<String> {
        self.accounts().reset_requests.clone()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let mut accounts = self.accounts();
        accounts.sign_in_attempts += 1;
        let id = match accounts.passwords.get(credentials.email.as_str()) {
            Some((id, password)) if password == credentials.password.expose_secret() => id.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        accounts
            .profiles
            .get(&id)
            .cloned()
            .ok_or(AuthError::ProfileNotFound)
    }

    async fn sign_up(&self, registration: &Registration) -> Result<User, AuthError> {
        let mut accounts = self.accounts();
        if accounts.passwords.contains_key(registration.email.as_str()) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        let user = User {
            id: UserId::generate(),
            email: registration.email.clone(),
            fullname: registration.fullname.clone(),
            avatar: None,
            banner: None,
            address: None,
            mobile: None,
            role: UserRole::User,
            date_joined: Utc::now(),
        };
        accounts.passwords.insert(
            registration.email.as_str().to_string(),
            (
                user.id.clone(),
                registration.password.expose_secret().to_string(),
            ),
        );
        accounts.profiles.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn reset_password(&self, email: &Email) -> Result<(), AuthError> {
        self.accounts().reset_requests.push(email.to_string());
        Ok(())
    }

    async fn fetch_profile(&self, id: &UserId) -> Result<User, AuthError> {
        self.accounts()
            .profiles
            .get(id)
            .cloned()
            .ok_or(AuthError::ProfileNotFound)
    }

    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<(), AuthError> {
        let mut accounts = self.accounts();
        let user = accounts
            .profiles
            .get_mut(id)
            .ok_or(AuthError::ProfileNotFound)?;
        let old_email = user.email.as_str().to_string();
        update.apply_to(user);
        let new_email = user.email.as_str().to_string();

        if new_email != old_email
            && let Some(entry) = accounts.passwords.remove(&old_email)
        {
            accounts.passwords.insert(new_email, entry);
        }
        Ok(())
    }
}
