//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password registration/login and JWT access/refresh tokens
//! - `cards` - Card validation and reduction to storable data

pub mod auth;
pub mod cards;
