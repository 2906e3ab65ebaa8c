//! User profile domain types.

use voltcart_core::{ProfileId, UserId};

use crate::validation::{FieldErrors, check_max_len};

/// Contact and address details attached one-to-one to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub phone_number: String,
}

/// A partial profile update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfileChanges {
    /// Check column widths. Blank values are allowed.
    ///
    /// # Errors
    ///
    /// Returns the field errors if any value is too long.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let fields = [
            ("first_name", &self.first_name, 100),
            ("last_name", &self.last_name, 100),
            ("shipping_address", &self.shipping_address, 255),
            ("billing_address", &self.billing_address, 255),
            ("phone_number", &self.phone_number, 20),
        ];
        for (field, value, max) in fields {
            if let Some(value) = value {
                check_max_len(&mut errors, field, value, Some(max));
            }
        }
        errors.into_result()
    }

    /// Apply these changes on top of `profile`.
    #[must_use]
    pub fn apply_to(self, mut profile: Profile) -> Profile {
        if let Some(v) = self.first_name {
            profile.first_name = v;
        }
        if let Some(v) = self.last_name {
            profile.last_name = v;
        }
        if let Some(v) = self.shipping_address {
            profile.shipping_address = v;
        }
        if let Some(v) = self.billing_address {
            profile.billing_address = v;
        }
        if let Some(v) = self.phone_number {
            profile.phone_number = v;
        }
        profile
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            id: ProfileId::new(1),
            user_id: UserId::new(1),
            first_name: "Ada".to_string(),
            last_name: String::new(),
            shipping_address: String::new(),
            billing_address: String::new(),
            phone_number: String::new(),
        }
    }

    #[test]
    fn test_apply_only_touches_given_fields() {
        let changes = ProfileChanges {
            shipping_address: Some("1 Main St".to_string()),
            ..ProfileChanges::default()
        };
        let updated = changes.apply_to(profile());
        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.shipping_address, "1 Main St");
    }

    #[test]
    fn test_phone_number_width() {
        let changes = ProfileChanges {
            phone_number: Some("0".repeat(21)),
            ..ProfileChanges::default()
        };
        let errors = changes.validate().unwrap_err();
        assert!(errors.get("phone_number").is_some());
    }
}
