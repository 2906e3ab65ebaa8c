//! Profile route handlers.
//!
//! A profile is visible to its owner and to staff. Anyone else gets 404.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voltcart_core::{ProfileId, UserId};

use crate::db::profiles::ProfileFields;
use crate::db::{ProfileRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Profile, ProfileChanges};
use crate::state::AppState;
use crate::validation::FieldErrors;

const NOT_FOUND: &str = "No UserProfile matches the given query.";

/// Profile as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: ProfileId,
    pub user: UserId,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub phone_number: String,
}

impl From<Profile> for ProfileView {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            user: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            shipping_address: profile.shipping_address,
            billing_address: profile.billing_address,
            phone_number: profile.phone_number,
        }
    }
}

/// Profile fields accepted on create and update. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePayload {
    first_name: Option<String>,
    last_name: Option<String>,
    shipping_address: Option<String>,
    billing_address: Option<String>,
    phone_number: Option<String>,
}

impl ProfilePayload {
    fn into_changes(self) -> std::result::Result<ProfileChanges, FieldErrors> {
        let changes = ProfileChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            shipping_address: self.shipping_address,
            billing_address: self.billing_address,
            phone_number: self.phone_number,
        };
        changes.validate()?;
        Ok(changes)
    }
}

/// List profiles: the caller's own, or every profile for staff.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<ProfileView>>> {
    let profiles = ProfileRepository::new(state.pool());

    let list = if user.is_staff {
        profiles.list().await?
    } else {
        profiles.get_for_user(user.id).await?.into_iter().collect()
    };

    Ok(Json(list.into_iter().map(ProfileView::from).collect()))
}

/// Create the caller's profile.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> Result<impl IntoResponse> {
    let changes = payload.into_changes()?;

    let created = ProfileRepository::new(state.pool())
        .create(&ProfileFields {
            user_id: user.id,
            first_name: changes.first_name.as_deref().unwrap_or_default(),
            last_name: changes.last_name.as_deref().unwrap_or_default(),
            shipping_address: changes.shipping_address.as_deref().unwrap_or_default(),
            billing_address: changes.billing_address.as_deref().unwrap_or_default(),
            phone_number: changes.phone_number.as_deref().unwrap_or_default(),
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Validation(FieldErrors::single(
                "user",
                "user profile with this user already exists.",
            )),
            other => other.into(),
        })?;

    tracing::info!(profile_id = %created.id, "profile created");

    Ok((StatusCode::CREATED, Json(ProfileView::from(created))))
}

/// Get the caller's profile, creating it on first access.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileView>> {
    let profile = own_profile(&state, &user).await?;
    Ok(Json(ProfileView::from(profile)))
}

/// Partially update the caller's profile.
#[instrument(skip(state))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> Result<Json<ProfileView>> {
    let changes = payload.into_changes()?;
    let profile = own_profile(&state, &user).await?;

    let updated = ProfileRepository::new(state.pool())
        .update(&changes.apply_to(profile))
        .await?;

    Ok(Json(ProfileView::from(updated)))
}

/// Get a profile by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProfileId>,
) -> Result<Json<ProfileView>> {
    let profile = visible_profile(&state, &user, id).await?;
    Ok(Json(ProfileView::from(profile)))
}

/// Partially update a profile by ID.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProfileId>,
    ApiJson(payload): ApiJson<ProfilePayload>,
) -> Result<Json<ProfileView>> {
    let changes = payload.into_changes()?;
    let profile = visible_profile(&state, &user, id).await?;

    let updated = ProfileRepository::new(state.pool())
        .update(&changes.apply_to(profile))
        .await?;

    Ok(Json(ProfileView::from(updated)))
}

/// Delete a profile by ID.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<ProfileId>,
) -> Result<StatusCode> {
    let profile = visible_profile(&state, &user, id).await?;
    ProfileRepository::new(state.pool()).delete(profile.id).await?;

    tracing::info!(profile_id = %profile.id, "profile deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// The caller's profile, created from their account names if missing.
async fn own_profile(state: &AppState, user: &CurrentUser) -> Result<Profile> {
    let profiles = ProfileRepository::new(state.pool());
    if let Some(profile) = profiles.get_for_user(user.id).await? {
        return Ok(profile);
    }

    let account = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_owned()))?;

    let profile = profiles
        .get_or_create_for_user(user.id, &account.first_name, &account.last_name)
        .await?;

    tracing::info!(profile_id = %profile.id, "profile created on first access");

    Ok(profile)
}

async fn visible_profile(state: &AppState, user: &CurrentUser, id: ProfileId) -> Result<Profile> {
    ProfileRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|profile| user.can_access(profile.user_id))
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))
}
