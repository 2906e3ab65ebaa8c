//! Authentication service.
//!
//! Provides password registration and login. Token handling lives in
//! [`tokens`].

mod error;
pub mod tokens;

pub use error::AuthError;
pub use tokens::{Claims, TokenPair, TokenService, TokenType};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use voltcart_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Account details for a new user.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_staff: bool,
}

/// Authentication service.
///
/// Handles user registration, password login, and token-subject lookup.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` or `AuthError::UsernameTaken` on a clash.
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        let email = Email::parse(registration.email)?;

        validate_password(registration.password)?;

        let password_hash = hash_password(registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                username: registration.username.trim(),
                email: &email,
                password_hash: &password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                is_staff: registration.is_staff,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(constraint) if constraint.contains("username") => {
                    AuthError::UsernameTaken
                }
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// Unknown emails, malformed emails, wrong passwords, and inactive
    /// accounts all fail the same way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the login is rejected.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Get the active user a token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist or is inactive.
    pub async fn active_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AuthError::UserNotFound)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Ensure this field has at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_password_is_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
