//! Offline catalog and account fixtures.
//!
//! ```yaml
//! products:
//!   - id: p-100
//!     name: Linen Shirt
//!     brand: Salt
//!     price: "45.00"
//!     maxQuantity: 5
//!     keywords: [linen, shirt]
//!     availableColors: ["#ffffff"]
//!     availableSizes: [S, M, L]
//!     dateAdded: 1700000000000
//! users:
//!   - id: u-1
//!     email: admin@example.com
//!     password: change-me-please
//!     fullname: Store Admin
//!     role: ADMIN
//! ```

use std::path::Path;

use chrono::Utc;
use lumina_core::{Email, Product, User, UserId, UserRole};
use lumina_storefront::auth::MemoryIdentity;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors loading a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid fixture YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A seeded account.
#[derive(Debug, Deserialize)]
pub struct FixtureUser {
    pub id: UserId,
    pub email: Email,
    pub password: String,
    pub fullname: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Products and accounts for the in-memory backends.
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub users: Vec<FixtureUser>,
}

impl Fixture {
    /// Split into the catalog seed and a populated identity provider.
    pub fn into_parts(self) -> (Vec<Product>, MemoryIdentity) {
        let accounts = MemoryIdentity::new();
        for seeded in self.users {
            let user = User {
                id: seeded.id,
                email: seeded.email,
                fullname: seeded.fullname,
                avatar: None,
                banner: None,
                address: None,
                mobile: None,
                role: seeded.role,
                date_joined: Utc::now(),
            };
            accounts.insert(user, &seeded.password);
        }
        (self.products, accounts)
    }
}

/// Read and parse a fixture file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid fixture YAML.
pub async fn load(path: &Path) -> Result<Fixture, FixtureError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let fixture: Fixture = serde_yaml::from_str(&content)?;
    info!(
        path = %path.display(),
        products = fixture.products.len(),
        users = fixture.users.len(),
        "Loaded catalog fixture"
    );
    Ok(fixture)
}
