//! Sign-in, sign-up and profile forms.

use lumina_core::{
    Address, Email, PhoneNumber, ProfileUpdate, User, ValidationErrors, count_digits, trimmed_len,
};
use secrecy::{ExposeSecret, SecretString};

use crate::config::CheckoutConfig;

/// Minimum password length accepted by the forms.
pub const MIN_PASSWORD_LENGTH: usize = 6;

fn check_email(errors: &mut ValidationErrors, raw: &str) -> Option<Email> {
    let parsed = Email::parse(raw.trim()).ok();
    errors.check(parsed.is_some(), "email", "Invalid email address");
    parsed
}

fn check_password(errors: &mut ValidationErrors, password: &SecretString) {
    errors.check(
        password.expose_secret().chars().count() >= MIN_PASSWORD_LENGTH,
        "password",
        "Password must be at least 6 characters",
    );
}

/// Validated sign-in credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// Validated sign-up input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub fullname: String,
    pub email: Email,
    pub password: SecretString,
}

/// Raw sign-in input.
#[derive(Debug, Clone)]
pub struct SignInForm {
    pub email: String,
    pub password: SecretString,
}

impl SignInForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        match email {
            Some(email) if errors.is_empty() => Ok(Credentials {
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Raw sign-up input.
#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub fullname: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl SignUpForm {
    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            trimmed_len(&self.fullname) >= 2,
            "fullname",
            "Full name must be at least 2 characters",
        );
        let email = check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.check(
            self.password.expose_secret() == self.confirm_password.expose_secret(),
            "confirmPassword",
            "Passwords don't match",
        );
        match email {
            Some(email) if errors.is_empty() => Ok(Registration {
                fullname: self.fullname.trim().to_string(),
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Raw account-edit input.
///
/// Empty optional fields mean "leave unset"; they never clear a saved value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub fullname: String,
    pub email: String,
    pub address: String,
    pub mobile: String,
    pub avatar: Option<String>,
    pub banner: Option<String>,
}

impl ProfileForm {
    /// Prefill from the current profile.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
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
            avatar: None,
            banner: None,
        }
    }

    /// Check every field and build the partial update.
    ///
    /// A phone number, when given, needs at least 8 digits.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self, config: &CheckoutConfig) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            trimmed_len(&self.fullname) >= 2,
            "fullname",
            "Full name must be at least 2 characters",
        );
        let email = check_email(&mut errors, &self.email);
        let mobile = self.mobile.trim();
        errors.check(
            mobile.is_empty() || count_digits(mobile) >= 8,
            "mobile",
            "Invalid mobile number",
        );

        let address = self.address.trim();
        errors.into_result(ProfileUpdate {
            fullname: Some(self.fullname.trim().to_string()),
            email,
            avatar: self.avatar.clone(),
            banner: self.banner.clone(),
            address: (!address.is_empty()).then(|| Address {
                address: address.to_string(),
                is_international: false,
            }),
            mobile: (!mobile.is_empty()).then(|| PhoneNumber {
                value: mobile.to_string(),
                dial_code: config.default_dial_code.clone(),
                country_code: config.default_country_code.clone(),
            }),
        })
    }
}
