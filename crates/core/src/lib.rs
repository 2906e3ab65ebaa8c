//! Voltcart Core - Shared domain types.
//!
//! This crate provides the types shared by the Voltcart components:
//! - `api` - JSON REST API for accounts, catalog, cart, and orders
//! - `cli` - Command-line tools for migrations, users, and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP. The optional `postgres` feature adds sqlx encode/decode impls.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, categories, payment methods, and line item pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
