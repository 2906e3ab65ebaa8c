//! Voltcart API library.
//!
//! JSON REST backend for the Voltcart shop: accounts and JWT auth, profiles,
//! the product catalog, per-user carts, and order placement. Exposed as a
//! library so the CLI can reuse the repositories and auth service.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
