//! User domain types.

use chrono::{DateTime, Utc};

use voltcart_core::{Email, UserId};

/// A shop account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique display handle.
    pub username: String,
    /// Unique email address, used to log in.
    pub email: Email,
    /// Given name, copied into the profile when it is first created.
    pub first_name: String,
    /// Family name, copied into the profile when it is first created.
    pub last_name: String,
    /// Inactive accounts cannot log in or use existing tokens.
    pub is_active: bool,
    /// Staff may manage the catalog and all orders.
    pub is_staff: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub is_staff: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
        }
    }
}

impl CurrentUser {
    /// Whether this caller may act on a row owned by `owner`.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_staff || self.id == owner
    }

    /// Owner filter for repository queries: `None` (every row) for staff,
    /// the caller's own ID otherwise.
    #[must_use]
    pub const fn scope(&self) -> Option<UserId> {
        if self.is_staff { None } else { Some(self.id) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn caller(id: i32, is_staff: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse("someone@example.com").unwrap(),
            is_staff,
        }
    }

    #[test]
    fn test_owner_can_access_own_rows() {
        assert!(caller(1, false).can_access(UserId::new(1)));
        assert!(!caller(1, false).can_access(UserId::new(2)));
    }

    #[test]
    fn test_staff_can_access_any_row() {
        assert!(caller(1, true).can_access(UserId::new(2)));
    }

    #[test]
    fn test_scope() {
        assert_eq!(caller(4, false).scope(), Some(UserId::new(4)));
        assert_eq!(caller(4, true).scope(), None);
    }
}
