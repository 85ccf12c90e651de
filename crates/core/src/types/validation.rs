//! Form validation primitives.
//!
//! Forms validate all fields at submit time and report every failure at once,
//! keyed by field name, so callers can show errors inline next to each input.

use core::fmt;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name (e.g., `fullname`, `cardnumber`).
    pub field: &'static str,
    /// Human-readable message for the shopper.
    pub message: String,
}

/// All field failures from one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure for `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record a failure when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// All recorded failures in field order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The first message recorded for `field`, if any.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Whether `field` failed.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Turn the accumulated set into a result.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one failure was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {joined}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Character count after trimming surrounding whitespace.
#[must_use]
pub fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_failures() {
        let mut errors = ValidationErrors::new();
        errors.check(false, "fullname", "too short");
        errors.check(true, "email", "bad");
        errors.check(false, "address", "too short");

        assert_eq!(errors.errors().len(), 2);
        assert!(errors.has("fullname"));
        assert!(!errors.has("email"));
        assert_eq!(errors.message_for("address"), Some("too short"));
        assert_eq!(
            errors.to_string(),
            "validation failed: fullname: too short; address: too short"
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));
        let mut errors = ValidationErrors::new();
        errors.add("x", "y");
        assert!(errors.into_result(7).is_err());
    }
}
