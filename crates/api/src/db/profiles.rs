//! Profile repository for database operations.

use sqlx::PgPool;

use voltcart_core::{ProfileId, UserId};

use super::RepositoryError;
use crate::models::Profile;

const PROFILE_COLUMNS: &str =
    "id, user_id, first_name, last_name, shipping_address, billing_address, phone_number";

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i32,
    user_id: i32,
    first_name: String,
    last_name: String,
    shipping_address: String,
    billing_address: String,
    phone_number: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ProfileId::new(row.id),
            user_id: UserId::new(row.user_id),
            first_name: row.first_name,
            last_name: row.last_name,
            shipping_address: row.shipping_address,
            billing_address: row.billing_address,
            phone_number: row.phone_number,
        }
    }
}

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the profile belonging to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM shop.user_profile WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    /// Get a user's profile, creating it from their account names if absent.
    ///
    /// Concurrent callers for the same user end up with the same row: the
    /// insert is a no-op when the unique `user_id` already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create_for_user(
        &self,
        user_id: UserId,
        first_name: &str,
        last_name: &str,
    ) -> Result<Profile, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user_profile (user_id, first_name, last_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(truncate(first_name, 100))
        .bind(truncate(last_name, 100))
        .execute(self.pool)
        .await?;

        self.get_for_user(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM shop.user_profile WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    /// List all profiles ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM shop.user_profile ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    /// Insert a profile for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a profile.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, profile: &ProfileFields<'_>) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r"
            INSERT INTO shop.user_profile
                (user_id, first_name, last_name, shipping_address, billing_address, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(profile.user_id)
        .bind(profile.first_name)
        .bind(profile.last_name)
        .bind(profile.shipping_address)
        .bind(profile.billing_address)
        .bind(profile.phone_number)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_unique_violation)?;

        Ok(Profile::from(row))
    }

    /// Write every editable field of `profile` back to its row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r"
            UPDATE shop.user_profile
            SET first_name = $2,
                last_name = $3,
                shipping_address = $4,
                billing_address = $5,
                phone_number = $6
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(profile.id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.shipping_address)
        .bind(&profile.billing_address)
        .bind(&profile.phone_number)
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProfileId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.user_profile WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Field values for a new profile row.
#[derive(Debug, Clone, Copy)]
pub struct ProfileFields<'a> {
    pub user_id: UserId,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub shipping_address: &'a str,
    pub billing_address: &'a str,
    pub phone_number: &'a str,
}

/// Account names may be wider than the profile columns.
fn truncate(value: &str, max_chars: usize) -> &str {
    value
        .char_indices()
        .nth(max_chars)
        .map_or(value, |(idx, _)| value.get(..idx).unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_leaves_short_values() {
        assert_eq!(truncate("Ada", 100), "Ada");
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let long = "é".repeat(120);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 100);
    }
}
