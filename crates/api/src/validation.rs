//! Field-level validation errors.
//!
//! Request payloads are checked field by field and every problem is reported
//! at once, keyed by field name:
//!
//! ```json
//! { "price": ["Ensure that there are no more than 2 decimal places."] }
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Message used when a required field is absent.
pub const REQUIRED: &str = "This field is required.";

/// Message used when a required string field is present but blank.
pub const BLANK: &str = "This field may not be blank.";

/// Maximum length of a color or size label on a cart or order line.
pub const MAX_VARIANT_LENGTH: usize = 50;

/// Validation messages grouped by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether no messages were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded against `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Merge another error set under a field prefix, e.g. `items.0.quantity`.
    pub fn nest(&mut self, prefix: &str, other: Self) {
        for (field, messages) in other.0 {
            let key = format!("{prefix}.{field}");
            self.0.entry(key).or_default().extend(messages);
        }
    }

    /// `Ok(())` when empty, otherwise the errors.
    ///
    /// # Errors
    ///
    /// Returns `self` if any message was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Take a required value, recording an error when it is missing.
pub fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

/// Check a string against blank and maximum length rules.
pub fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: Option<usize>) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return;
    }
    check_max_len(errors, field, value, max_len);
}

/// Check only the maximum length of a string (blank allowed).
pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: &str, max_len: Option<usize>) {
    if let Some(max) = max_len
        && value.chars().count() > max
    {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }
}

/// Check a `NUMERIC(max_digits, decimal_places)` value.
pub fn check_decimal(
    errors: &mut FieldErrors,
    field: &str,
    value: Decimal,
    max_digits: u32,
    decimal_places: u32,
) {
    let normalized = value.normalize();
    if normalized.scale() > decimal_places {
        errors.add(
            field,
            format!("Ensure that there are no more than {decimal_places} decimal places."),
        );
        return;
    }

    let whole_digits = normalized.trunc().abs().to_string().trim_start_matches('0').len();
    let max_whole = max_digits.saturating_sub(decimal_places) as usize;
    if whole_digits > max_whole {
        errors.add(
            field,
            format!("Ensure that there are no more than {max_whole} digits before the decimal point."),
        );
    }
}

/// Deserialize a present field as `Some`, so `Option<Option<T>>` can tell an
/// explicit `null` apart from an absent key.
///
/// Use with `#[serde(default, deserialize_with = "present")]`.
///
/// # Errors
///
/// Propagates the inner deserializer's error.
pub fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_serialize_as_map_of_lists() {
        let mut errors = FieldErrors::new();
        errors.add("name", REQUIRED);
        errors.add("name", "second");
        errors.add("brand", BLANK);

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "brand": ["This field may not be blank."],
                "name": ["This field is required.", "second"],
            })
        );
    }

    #[test]
    fn test_nest_prefixes_fields() {
        let mut outer = FieldErrors::new();
        outer.nest("items[1]", FieldErrors::single("quantity", "bad"));
        assert_eq!(outer.get("items[1].quantity").unwrap(), ["bad"]);
    }

    #[test]
    fn test_check_text() {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "a", "   ", Some(5));
        check_text(&mut errors, "b", "toolong", Some(5));
        check_text(&mut errors, "c", "fine", Some(5));
        assert_eq!(errors.get("a").unwrap(), [BLANK]);
        assert!(errors.get("b").is_some());
        assert!(errors.get("c").is_none());
    }

    #[test]
    fn test_check_decimal_places() {
        let mut errors = FieldErrors::new();
        check_decimal(&mut errors, "price", Decimal::new(19_999, 3), 10, 2);
        assert!(errors.get("price").is_some());

        let mut errors = FieldErrors::new();
        check_decimal(&mut errors, "price", Decimal::new(19_990, 3), 10, 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_check_decimal_whole_digits() {
        let mut errors = FieldErrors::new();
        check_decimal(&mut errors, "price", Decimal::new(99_999_999, 0), 10, 2);
        assert!(errors.is_empty());

        check_decimal(&mut errors, "price", Decimal::new(100_000_000, 0), 10, 2);
        assert!(errors.get("price").is_some());
    }

    #[test]
    fn test_present_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "present")]
            image: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.image, None);

        let null: Patch = serde_json::from_str(r#"{"image": null}"#).unwrap();
        assert_eq!(null.image, Some(None));

        let set: Patch = serde_json::from_str(r#"{"image": "a.png"}"#).unwrap();
        assert_eq!(set.image, Some(Some("a.png".to_string())));
    }
}
