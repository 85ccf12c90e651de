//! Core types for Lumina.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod role;
pub mod user;
pub mod validation;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::Product;
pub use role::UserRole;
pub use user::{Address, PhoneNumber, ProfileUpdate, User, count_digits};
pub use validation::{FieldError, ValidationErrors, trimmed_len};
