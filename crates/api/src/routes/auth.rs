//! Account and token route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voltcart_core::UserId;

use crate::error::Result;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthService, MAX_USERNAME_LENGTH, Registration};
use crate::state::AppState;
use crate::validation::{FieldErrors, REQUIRED, check_max_len, check_text, required};

/// User snapshot returned by the auth endpoints.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.to_string(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// =============================================================================
// Tokens
// =============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserView,
}

/// Exchange email and password for an access/refresh token pair.
#[instrument(skip(state, request))]
pub async fn create_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let mut errors = FieldErrors::new();
    let email = required(&mut errors, "email", request.email);
    let password = required(&mut errors, "password", request.password);
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };

    let user = AuthService::new(state.pool()).login(&email, &password).await?;
    let pair = state.tokens().issue_pair(user.id)?;

    tracing::info!(user_id = %user.id, "token pair issued");

    Ok(Json(LoginResponse {
        access: pair.access,
        refresh: pair.refresh,
        user: UserView::from(&user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Mint a new access token from a refresh token.
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>> {
    let refresh = request
        .refresh
        .ok_or_else(|| FieldErrors::single("refresh", REQUIRED))?;

    let access = state.tokens().refresh(&refresh)?;
    Ok(Json(RefreshResponse { access }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    token: Option<String>,
}

/// Check that a token is valid. Responds `{}` on success.
#[instrument(skip_all)]
pub async fn verify_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<Json<serde_json::Value>> {
    let token = request
        .token
        .ok_or_else(|| FieldErrors::single("token", REQUIRED))?;

    state.tokens().verify(&token)?;
    Ok(Json(serde_json::json!({})))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Register a new account.
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", request.username);
    if let Some(username) = &username {
        check_text(&mut errors, "username", username, Some(MAX_USERNAME_LENGTH));
    }
    let email = required(&mut errors, "email", request.email);
    let password = required(&mut errors, "password", request.password);
    check_max_len(&mut errors, "first_name", &request.first_name, Some(150));
    check_max_len(&mut errors, "last_name", &request.last_name, Some(150));
    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(errors.into());
    };
    errors.into_result()?;

    let user = AuthService::new(state.pool())
        .register(Registration {
            username: &username,
            email: &email,
            password: &password,
            first_name: &request.first_name,
            last_name: &request.last_name,
            is_staff: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

/// Get the caller's account.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserView>> {
    let user = AuthService::new(state.pool())
        .active_user(current.id)
        .await?;
    Ok(Json(UserView::from(&user)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use voltcart_core::Email;

    use super::*;

    #[test]
    fn test_user_view_is_the_login_snapshot() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(4),
            username: "ada".to_string(),
            email: Email::parse("ada@Example.com").unwrap(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            is_active: true,
            is_staff: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["is_active"], true);
        assert!(json.get("is_staff").is_none());
        assert!(json.get("first_name").is_none());
        assert!(json.get("last_name").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email": "a@b.co", "password": "hunter22"}"#).unwrap();
        assert!(!format!("{request:?}").contains("hunter22"));
    }
}
