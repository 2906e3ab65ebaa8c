//! Access and refresh token issuance.
//!
//! Tokens are HS256 JWTs carrying `{token_type, user_id, jti, iat, exp}`.
//! Access tokens authenticate requests; refresh tokens only mint new access
//! tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use voltcart_core::UserId;

use super::AuthError;
use crate::config::AuthConfig;

/// Which role a token plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub user_id: UserId,
    /// Unique token ID.
    pub jti: String,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and checks tokens with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from auth settings.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Issue an access and a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    /// Issue a single token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user_id: UserId, token_type: TokenType) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let now = Utc::now();

        let claims = Claims {
            token_type,
            user_id,
            jti: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenSigning(e.to_string()))
    }

    /// Decode a token and check its signature, expiry, and type.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if any check fails.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode_any(token)?;
        if claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// Mint a new access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the refresh token is invalid,
    /// expired, or is an access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.decode(refresh_token, TokenType::Refresh)?;
        self.issue(claims.user_id, TokenType::Access)
    }

    /// Check that a token of either type is valid.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is invalid or expired.
    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        self.decode_any(token).map(|_| ())
    }

    fn decode_any(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn service(access_ttl: Duration) -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: SecretString::from("kR7#mP2$vL9@nQ4&wX6*hJ3!bT8^cF5%"),
            access_token_ttl: access_ttl,
            refresh_token_ttl: Duration::hours(24),
        })
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service(Duration::minutes(60));
        let pair = tokens.issue_pair(UserId::new(7)).unwrap();

        let claims = tokens.decode(&pair.access, TokenType::Access).unwrap();
        assert_eq!(claims.user_id, UserId::new(7));
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = service(Duration::minutes(60));
        let pair = tokens.issue_pair(UserId::new(7)).unwrap();

        assert!(matches!(
            tokens.decode(&pair.refresh, TokenType::Access),
            Err(AuthError::InvalidToken)
        ));
        assert!(tokens.refresh(&pair.access).is_err());
    }

    #[test]
    fn test_refresh_mints_access_token() {
        let tokens = service(Duration::minutes(60));
        let pair = tokens.issue_pair(UserId::new(3)).unwrap();

        let access = tokens.refresh(&pair.refresh).unwrap();
        let claims = tokens.decode(&access, TokenType::Access).unwrap();
        assert_eq!(claims.user_id, UserId::new(3));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service(Duration::minutes(-5));
        let access = tokens.issue(UserId::new(1), TokenType::Access).unwrap();

        assert!(tokens.verify(&access).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let ours = service(Duration::minutes(60));
        let theirs = TokenService::new(&AuthConfig {
            jwt_secret: SecretString::from("Zq8!rT2@yU5#iO9$pA1%sD4^fG7&hJ0*"),
            access_token_ttl: Duration::minutes(60),
            refresh_token_ttl: Duration::hours(24),
        });

        let forged = theirs.issue(UserId::new(1), TokenType::Access).unwrap();
        assert!(ours.verify(&forged).is_err());
        assert!(ours.verify("not-a-token").is_err());
    }

    #[test]
    fn test_each_token_has_unique_jti() {
        let tokens = service(Duration::minutes(60));
        let a = tokens.issue(UserId::new(1), TokenType::Access).unwrap();
        let b = tokens.issue(UserId::new(1), TokenType::Access).unwrap();

        let a = tokens.decode(&a, TokenType::Access).unwrap();
        let b = tokens.decode(&b, TokenType::Access).unwrap();
        assert_ne!(a.jti, b.jti);
    }
}
