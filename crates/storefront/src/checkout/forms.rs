//! Shipping and payment forms.
//!
//! Forms hold raw shopper input. `validate` checks every field at once and
//! either returns the typed details or all field errors together.

use std::fmt;

use lumina_core::{Email, PhoneNumber, User, ValidationErrors, count_digits, trimmed_len};
use serde::{Deserialize, Serialize};

use crate::config::CheckoutConfig;

/// Raw shipping input (checkout step 2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingForm {
    pub fullname: String,
    pub email: String,
    pub address: String,
    pub mobile: String,
    pub is_international: bool,
}

/// Validated shipping details stored in the checkout draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub fullname: String,
    pub email: Email,
    pub address: String,
    pub mobile: PhoneNumber,
    pub is_international: bool,
}

impl ShippingForm {
    /// Prefill from a stored draft, falling back to the signed-in profile.
    #[must_use]
    pub fn prefill(draft: Option<&ShippingDetails>, user: Option<&User>) -> Self {
        if let Some(details) = draft {
            return Self::from(details);
        }
        let Some(user) = user else {
            return Self::default();
        };
        Self {
            fullname: user.fullname.clone(),
            email: user.email.to_string(),
            address: user
                .address
                .as_ref()
                .map(|a| a.address.clone())
                .unwrap_or_default(),
            mobile: user
                .mobile
                .as_ref()
                .map(|m| m.value.clone())
                .unwrap_or_default(),
            is_international: false,
        }
    }

    /// Check every field.
    ///
    /// The phone number gets the configured country and dial code.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self, config: &CheckoutConfig) -> Result<ShippingDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            trimmed_len(&self.fullname) >= 2,
            "fullname",
            "Full name must be at least 2 characters",
        );
        let email = Email::parse(self.email.trim());
        errors.check(email.is_ok(), "email", "Invalid email address");
        errors.check(
            trimmed_len(&self.address) >= 5,
            "address",
            "Address must be at least 5 characters",
        );
        errors.check(
            count_digits(&self.mobile) >= 8,
            "mobile",
            "Invalid mobile number",
        );

        match email {
            Ok(email) if errors.is_empty() => Ok(ShippingDetails {
                fullname: self.fullname.trim().to_string(),
                email,
                address: self.address.trim().to_string(),
                mobile: PhoneNumber {
                    value: self.mobile.trim().to_string(),
                    dial_code: config.default_dial_code.clone(),
                    country_code: config.default_country_code.clone(),
                },
                is_international: self.is_international,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&ShippingDetails> for ShippingForm {
    fn from(details: &ShippingDetails) -> Self {
        Self {
            fullname: details.fullname.clone(),
            email: details.email.to_string(),
            address: details.address.clone(),
            mobile: details.mobile.value.clone(),
            is_international: details.is_international,
        }
    }
}

/// How the shopper pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paypal,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "credit-card" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Raw payment input (checkout step 3).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    pub method: PaymentMethod,
    pub name: String,
    pub card_number: String,
    pub expiry: String,
    pub ccv: String,
}

/// Validated payment details.
///
/// `Debug` masks the card number and omits the CVV.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub name: String,
    pub card_number: String,
    pub expiry: String,
    pub ccv: String,
}

fn masked(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits.iter().skip(digits.len().saturating_sub(4)).collect();
    format!("**** {tail}")
}

impl fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentForm")
            .field("method", &self.method)
            .field("name", &self.name)
            .field("card_number", &masked(&self.card_number))
            .field("expiry", &self.expiry)
            .field("ccv", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("method", &self.method)
            .field("name", &self.name)
            .field("card_number", &masked(&self.card_number))
            .field("expiry", &self.expiry)
            .field("ccv", &"[REDACTED]")
            .finish()
    }
}

impl PaymentDetails {
    /// Card number with all but the last four digits hidden.
    #[must_use]
    pub fn masked_card_number(&self) -> String {
        masked(&self.card_number)
    }
}

impl PaymentForm {
    /// Prefill from previously entered details.
    #[must_use]
    pub fn prefill(details: Option<&PaymentDetails>) -> Self {
        details.map_or_else(Self::default, |d| Self {
            method: d.method,
            name: d.name.clone(),
            card_number: d.card_number.clone(),
            expiry: d.expiry.clone(),
            ccv: d.ccv.clone(),
        })
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<PaymentDetails, ValidationErrors> {
        let card_len = self.card_number.trim().chars().count();
        let ccv_len = self.ccv.trim().chars().count();

        let mut errors = ValidationErrors::new();
        errors.check(
            trimmed_len(&self.name) >= 4,
            "name",
            "Name on card is required",
        );
        errors.check(
            (13..=19).contains(&card_len),
            "cardnumber",
            "Invalid card number",
        );
        errors.check(
            !self.expiry.trim().is_empty(),
            "expiry",
            "Expiry date required",
        );
        errors.check((3..=4).contains(&ccv_len), "ccv", "CVV required");

        errors.into_result(PaymentDetails {
            method: self.method,
            name: self.name.trim().to_string(),
            card_number: self.card_number.trim().to_string(),
            expiry: self.expiry.trim().to_string(),
            ccv: self.ccv.trim().to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use lumina_core::{Address, UserId, UserRole};

    fn valid_shipping() -> ShippingForm {
        ShippingForm {
            fullname: "Ana Cruz".to_string(),
            email: "ana@example.com".to_string(),
            address: "12 Rizal Ave, Manila".to_string(),
            mobile: "0917 123 4567".to_string(),
            is_international: false,
        }
    }

    fn valid_payment() -> PaymentForm {
        PaymentForm {
            method: PaymentMethod::CreditCard,
            name: "Ana Cruz".to_string(),
            card_number: "4111111111111111".to_string(),
            expiry: "12/29".to_string(),
            ccv: "123".to_string(),
        }
    }

    #[test]
    fn test_valid_shipping_gets_phone_defaults() {
        let details = valid_shipping()
            .validate(&CheckoutConfig::default())
            .unwrap();
        assert_eq!(details.mobile.country_code, "PH");
        assert_eq!(details.mobile.dial_code, "+63");
        assert_eq!(details.email.as_str(), "ana@example.com");
    }

    #[test]
    fn test_shipping_reports_every_field() {
        let form = ShippingForm {
            fullname: "A".to_string(),
            email: "not-an-email".to_string(),
            address: "12".to_string(),
            mobile: "12-34".to_string(),
            is_international: true,
        };
        let errors = form.validate(&CheckoutConfig::default()).unwrap_err();
        for field in ["fullname", "email", "address", "mobile"] {
            assert!(errors.has(field), "expected error for {field}");
        }
    }

    #[test]
    fn test_payment_length_bounds() {
        assert!(valid_payment().validate().is_ok());

        let mut form = valid_payment();
        form.card_number = "411111111111".to_string();
        form.ccv = "12345".to_string();
        form.expiry = "  ".to_string();
        form.name = "Ana".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 4);
    }

    #[test]
    fn test_payment_accepts_inclusive_bounds() {
        let mut form = valid_payment();
        form.name = "Anna".to_string();
        form.ccv = "1234".to_string();
        for card in ["4111111111111", "4111111111111111111"] {
            form.card_number = card.to_string();
            assert!(form.validate().is_ok(), "card {card}");
        }
        form.ccv = "123".to_string();
        assert!(form.validate().is_ok());

        form.card_number = "41111111111111111111".to_string();
        assert!(form.validate().unwrap_err().has("cardnumber"));
    }

    #[test]
    fn test_shipping_accepts_inclusive_bounds() {
        let config = CheckoutConfig::default();
        let mut form = valid_shipping();
        form.fullname = "Al".to_string();
        form.address = " Cebu1 ".to_string();
        form.mobile = "0917-123-4".to_string();
        assert!(form.validate(&config).is_ok());

        form.fullname = "A".to_string();
        form.address = "Cebu".to_string();
        form.mobile = "0917-123".to_string();
        let errors = form.validate(&config).unwrap_err();
        assert!(errors.has("fullname"));
        assert!(errors.has("address"));
        assert!(errors.has("mobile"));
    }

    #[test]
    fn test_payment_debug_redacts_card() {
        let details = valid_payment().validate().unwrap();
        let debug_output = format!("{details:?}");
        assert!(debug_output.contains("**** 1111"));
        assert!(!debug_output.contains("4111111111111111"));
        assert!(!debug_output.contains("123\""));
    }

    #[test]
    fn test_prefill_prefers_draft_then_profile() {
        let user = User {
            id: UserId::new("u1"),
            email: Email::parse("ana@example.com").unwrap(),
            fullname: "Ana Cruz".to_string(),
            avatar: None,
            banner: None,
            address: Some(Address {
                address: "Profile St 1".to_string(),
                is_international: false,
            }),
            mobile: None,
            role: UserRole::User,
            date_joined: DateTime::from_timestamp_millis(0).unwrap(),
        };

        let from_profile = ShippingForm::prefill(None, Some(&user));
        assert_eq!(from_profile.address, "Profile St 1");

        let draft = valid_shipping()
            .validate(&CheckoutConfig::default())
            .unwrap();
        let from_draft = ShippingForm::prefill(Some(&draft), Some(&user));
        assert_eq!(from_draft.address, "12 Rizal Ave, Manila");
    }

    #[test]
    fn test_payment_method_tokens() {
        assert_eq!("paypal".parse::<PaymentMethod>().unwrap(), PaymentMethod::Paypal);
        assert!("cash".parse::<PaymentMethod>().is_err());
        assert_eq!(
            serde_json::to_value(PaymentMethod::CreditCard).unwrap(),
            "credit-card"
        );
    }
}
