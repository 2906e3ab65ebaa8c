//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! VOLTCART_NEW_USER_PASSWORD='...' vc-cli user create -e staff@example.com -u staff --staff
//! ```
//!
//! # Environment Variables
//!
//! - `VOLTCART_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `VOLTCART_NEW_USER_PASSWORD` - Password for the new account

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use voltcart_api::db;
use voltcart_api::services::auth::{AuthError, AuthService, Registration};

use super::{CommandError, database_url};

const PASSWORD_VAR: &str = "VOLTCART_NEW_USER_PASSWORD";

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Setup(#[from] CommandError),

    /// Password variable is missing.
    #[error("Missing environment variable: {PASSWORD_VAR}")]
    MissingPassword,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Registration was rejected.
    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Account details given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_staff: bool,
}

/// Create a user account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the password is missing or weak, the email or
/// username is taken, or the database is unreachable.
pub async fn create(account: &NewAccount<'_>) -> Result<i32, UserError> {
    let database_url = database_url()?;
    let password = std::env::var(PASSWORD_VAR)
        .map(SecretString::from)
        .map_err(|_| UserError::MissingPassword)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!(
        email = account.email,
        staff = account.is_staff,
        "Creating user"
    );

    let user = AuthService::new(&pool)
        .register(Registration {
            username: account.username,
            email: account.email,
            password: password.expose_secret(),
            first_name: account.first_name,
            last_name: account.last_name,
            is_staff: account.is_staff,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Staff: {}",
        user.id,
        user.email,
        user.is_staff
    );

    Ok(user.id.as_i32())
}
