//! Lumina Boutique storefront library.
//!
//! Shopper-side state containers (cart, filters, checkout, auth), the cached
//! catalog client, route guards and admin catalog writes, plus the Firebase
//! adapters they run against in production.
//!
//! # Modules
//!
//! - [`cart`], [`filter`], [`checkout`], [`auth`] - the stores
//! - [`catalog`] - backend trait, cache, stale-fetch guard, memory and
//!   Firestore backends
//! - [`navigation`] - routes and access guards
//! - [`admin`] - role-checked product create/update/delete
//! - [`storage`] - versioned device-local snapshots
//! - [`state`] - the [`state::Storefront`] context wiring it all together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filter;
pub mod firestore;
pub mod navigation;
pub mod state;
pub mod storage;
