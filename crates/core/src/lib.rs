//! Lumina Core - Shared types library.
//!
//! This crate provides the domain types used across all Lumina components:
//! - `storefront` - Shopper-side stores (cart, filters, checkout, auth) and
//!   the catalog client
//! - `cli` - Command-line driver for browsing, checkout and catalog admin
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices and emails, plus the
//!   product and user records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
