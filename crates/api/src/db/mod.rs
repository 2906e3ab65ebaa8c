//! Database operations for the shop `PostgreSQL` schema.
//!
//! ## Tables (schema `shop`)
//!
//! - `user` - Accounts (email login, argon2 password hash, staff flag)
//! - `user_profile` - Names, addresses, phone (one per user, created lazily)
//! - `product` - Catalog
//! - `cart` / `cart_item` - One cart per user, one row per (cart, product)
//! - `card_details` - Last four digits, expiry, and keyed fingerprint only
//! - `order` / `order_item` - Placed orders and their lines
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p voltcart-cli -- migrate
//! ```

pub mod carts;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profiles::ProfileRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, keeping every other error as `Database`.
    ///
    /// The conflict message carries the violated constraint name so callers can
    /// tell which column clashed.
    pub(crate) fn from_unique_violation(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(db_err.constraint().unwrap_or("unique").to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
