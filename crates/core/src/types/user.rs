//! User profile types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;
use super::role::UserRole;

/// A shopper's saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Free-form address line.
    pub address: String,
    /// Whether the address is outside the home country.
    #[serde(default)]
    pub is_international: bool,
}

/// A phone number with its dialing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    /// The number as typed by the shopper.
    pub value: String,
    /// Dial prefix (e.g., `+63`).
    #[serde(default)]
    pub dial_code: String,
    /// ISO country code (e.g., `PH`).
    #[serde(default)]
    pub country_code: String,
}

impl PhoneNumber {
    /// Number of ASCII digits in `value`.
    #[must_use]
    pub fn digit_count(&self) -> usize {
        count_digits(&self.value)
    }
}

/// Count ASCII digits in a phone string, ignoring spaces, dashes and `+`.
#[must_use]
pub fn count_digits(value: &str) -> usize {
    value.chars().filter(char::is_ascii_digit).count()
}

/// A user profile as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-provider user id (also the profile document id).
    pub id: UserId,
    /// Sign-in email.
    pub email: Email,
    /// Display name.
    pub fullname: String,
    /// Avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Profile banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    /// Saved shipping address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Saved phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<PhoneNumber>,
    /// Access role.
    #[serde(default)]
    pub role: UserRole,
    /// When the account was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Whether this user may use the admin area.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A partial profile edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<PhoneNumber>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fullname.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.banner.is_none()
            && self.address.is_none()
            && self.mobile.is_none()
    }

    /// Names of the fields this update sets, in document order.
    #[must_use]
    pub fn field_paths(&self) -> Vec<&'static str> {
        [
            ("fullname", self.fullname.is_some()),
            ("email", self.email.is_some()),
            ("avatar", self.avatar.is_some()),
            ("banner", self.banner.is_some()),
            ("address", self.address.is_some()),
            ("mobile", self.mobile.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Merge the set fields into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(fullname) = &self.fullname {
            user.fullname.clone_from(fullname);
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = Some(avatar.clone());
        }
        if let Some(banner) = &self.banner {
            user.banner = Some(banner.clone());
        }
        if let Some(address) = &self.address {
            user.address = Some(address.clone());
        }
        if let Some(mobile) = &self.mobile {
            user.mobile = Some(mobile.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shopper() -> User {
        User {
            id: UserId::new("u1"),
            email: Email::parse("ana@example.com").unwrap(),
            fullname: "Ana Cruz".to_string(),
            avatar: None,
            banner: None,
            address: None,
            mobile: None,
            role: UserRole::User,
            date_joined: DateTime::from_timestamp_millis(0).unwrap(),
        }
    }

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut user = shopper();
        let update = ProfileUpdate {
            fullname: Some("Ana M. Cruz".to_string()),
            address: Some(Address {
                address: "12 Rizal Ave".to_string(),
                is_international: false,
            }),
            ..ProfileUpdate::default()
        };
        update.apply_to(&mut user);

        assert_eq!(user.fullname, "Ana M. Cruz");
        assert_eq!(user.email.as_str(), "ana@example.com");
        assert!(user.address.is_some());
        assert_eq!(update.field_paths(), vec!["fullname", "address"]);
    }

    #[test]
    fn test_role_defaults_to_user_when_missing() {
        let json = serde_json::json!({
            "id": "u2",
            "email": "bo@example.com",
            "fullname": "Bo",
            "dateJoined": 0
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert!(!user.is_admin());
    }

    #[test]
    fn test_digit_count_ignores_punctuation() {
        assert_eq!(count_digits("+63 912-345-6789"), 12);
    }
}
