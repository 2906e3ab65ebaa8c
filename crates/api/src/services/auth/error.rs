//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] voltcart_core::EmailError),

    /// Unknown email, wrong password, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Username already registered.
    #[error("username already registered")]
    UsernameTaken,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Token malformed, expired, wrongly signed, or of the wrong type.
    #[error("token is invalid or expired")]
    InvalidToken,

    /// Token was valid but its user no longer exists or is inactive.
    #[error("user not found or inactive")]
    UserNotFound,

    /// Token could not be signed.
    #[error("token signing error: {0}")]
    TokenSigning(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
