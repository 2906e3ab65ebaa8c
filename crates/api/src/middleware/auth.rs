//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <access token>` (the
//! `JWT` scheme is accepted as well). The token's user must still exist and
//! be active.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, TokenType};
use crate::state::AppState;

const ACCEPTED_SCHEMES: [&str; 2] = ["Bearer", "JWT"];

/// Extractor that requires an authenticated, active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
#[derive(Debug)]
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens().decode(token, TokenType::Access)?;

        let user = AuthService::new(state.pool())
            .active_user(claims.user_id)
            .await?;

        Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(CurrentUser::from(&user)))
    }
}

/// Extractor that requires an authenticated staff user.
///
/// Non-staff callers get 403.
#[derive(Debug)]
pub struct RequireStaff(pub CurrentUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_staff {
            return Err(AppError::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Pull the token out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::Unauthorized("Authentication credentials were not provided.".to_owned())
        })?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header.".to_owned()))?;

    let (scheme, token) = value.trim().split_once(' ').ok_or_else(|| {
        AppError::Unauthorized(
            "Authorization header must contain two space-delimited values".to_owned(),
        )
    })?;

    if !ACCEPTED_SCHEMES.contains(&scheme) {
        return Err(AppError::Unauthorized(
            "Authentication credentials were not provided.".to_owned(),
        ));
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(AppError::Unauthorized(
            "Authorization header must contain two space-delimited values".to_owned(),
        ));
    }

    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_and_jwt_schemes() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("JWT abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_other_schemes_and_shapes() {
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers("Bearer")).is_err());
        assert!(bearer_token(&headers("Bearer a b")).is_err());
    }
}
