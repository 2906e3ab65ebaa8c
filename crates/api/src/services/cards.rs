//! Card data reduction.
//!
//! Full card numbers and CVVs never reach the database. A submitted card is
//! checked, then reduced to its last four digits, expiry, and a keyed
//! HMAC-SHA256 fingerprint of the number. The CVV is checked and dropped.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use crate::models::TokenizedCard;
use crate::validation::FieldErrors;

type HmacSha256 = Hmac<Sha256>;

const MIN_NUMBER_DIGITS: usize = 12;
const MAX_NUMBER_DIGITS: usize = 19;

/// Card fields as submitted by a client.
#[derive(Clone, Copy)]
pub struct CardInput<'a> {
    pub number: &'a str,
    pub expiry: &'a str,
    pub cvv: &'a str,
}

impl std::fmt::Debug for CardInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardInput")
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// A problem with one card field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("Enter a valid card number.")]
    InvalidNumber,
    #[error("Enter the expiry as MM/YY.")]
    InvalidExpiry,
    #[error("Enter a 3 or 4 digit security code.")]
    InvalidCvv,
    #[error("card fingerprint key rejected: {0}")]
    Key(String),
}

impl CardError {
    /// The request field this error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidNumber | Self::Key(_) => "cardNumber",
            Self::InvalidExpiry => "expiry",
            Self::InvalidCvv => "cvv",
        }
    }
}

/// Collect card errors into field errors.
#[must_use]
pub fn card_field_errors(errors: &[CardError]) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for error in errors {
        fields.add(error.field(), error.to_string());
    }
    fields
}

/// Reduces submitted cards to what may be stored.
#[derive(Clone)]
pub struct CardVault {
    key: SecretString,
}

impl std::fmt::Debug for CardVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardVault")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CardVault {
    /// Create a vault keyed with the fingerprint secret.
    #[must_use]
    pub const fn new(key: SecretString) -> Self {
        Self { key }
    }

    /// Check every card field and reduce the card.
    ///
    /// # Errors
    ///
    /// Returns every field problem found, not just the first.
    pub fn tokenize(&self, card: CardInput<'_>) -> Result<TokenizedCard, Vec<CardError>> {
        let mut errors = Vec::new();

        let digits = normalize_number(card.number);
        if digits.is_none() {
            errors.push(CardError::InvalidNumber);
        }
        let expiry = card.expiry.trim();
        if !is_valid_expiry(expiry) {
            errors.push(CardError::InvalidExpiry);
        }
        if !is_valid_cvv(card.cvv.trim()) {
            errors.push(CardError::InvalidCvv);
        }

        let Some(digits) = digits else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let fingerprint = self.fingerprint(&digits).map_err(|e| vec![e])?;
        let last4 = digits
            .get(digits.len() - 4..)
            .ok_or_else(|| vec![CardError::InvalidNumber])?
            .to_owned();

        Ok(TokenizedCard {
            last4,
            expiry: expiry.to_owned(),
            fingerprint,
        })
    }

    /// Hex HMAC-SHA256 of the card digits.
    ///
    /// # Errors
    ///
    /// Returns `CardError::Key` if the key is rejected by the MAC.
    pub fn fingerprint(&self, digits: &str) -> Result<String, CardError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| CardError::Key(e.to_string()))?;
        mac.update(digits.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Strip spaces and dashes; `None` unless 12 to 19 digits remain.
fn normalize_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let len = digits.len();
    (digits.chars().all(|c| c.is_ascii_digit())
        && (MIN_NUMBER_DIGITS..=MAX_NUMBER_DIGITS).contains(&len))
    .then_some(digits)
}

/// `MM/YY` with a month of 01 to 12.
fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

fn is_valid_cvv(cvv: &str) -> bool {
    (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vault() -> CardVault {
        CardVault::new(SecretString::from("pL3@vN8#qR1$tY6%uI0^oP4&aS7*dF2!"))
    }

    fn card<'a>(number: &'a str, expiry: &'a str, cvv: &'a str) -> CardInput<'a> {
        CardInput {
            number,
            expiry,
            cvv,
        }
    }

    #[test]
    fn test_tokenize_keeps_only_last_four() {
        let stored = vault()
            .tokenize(card("4242 4242 4242 4242", "12/29", "123"))
            .unwrap();
        assert_eq!(stored.last4, "4242");
        assert_eq!(stored.expiry, "12/29");
        assert_eq!(stored.fingerprint.len(), 64);
        assert!(!stored.fingerprint.contains("4242424242424242"));
    }

    #[test]
    fn test_fingerprint_ignores_formatting() {
        let a = vault().tokenize(card("4242424242424242", "01/30", "999")).unwrap();
        let b = vault().tokenize(card("4242-4242-4242-4242", "02/31", "1234")).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_fingerprint_depends_on_key() {
        let other = CardVault::new(SecretString::from("zX9!cV4@bN7#mQ2$wE5%rT8^yU1&iO3*"));
        assert_ne!(
            vault().fingerprint("4242424242424242").unwrap(),
            other.fingerprint("4242424242424242").unwrap()
        );
    }

    #[test]
    fn test_reports_every_bad_field() {
        let errors = vault().tokenize(card("42", "13/29", "12")).unwrap_err();
        assert_eq!(
            errors,
            vec![
                CardError::InvalidNumber,
                CardError::InvalidExpiry,
                CardError::InvalidCvv
            ]
        );

        let fields = card_field_errors(&errors);
        assert!(fields.get("cardNumber").is_some());
        assert!(fields.get("expiry").is_some());
        assert!(fields.get("cvv").is_some());
    }

    #[test]
    fn test_expiry_format() {
        assert!(is_valid_expiry("01/25"));
        assert!(is_valid_expiry("12/99"));
        assert!(!is_valid_expiry("00/25"));
        assert!(!is_valid_expiry("1/25"));
        assert!(!is_valid_expiry("01-25"));
        assert!(!is_valid_expiry("01/2025"));
    }

    #[test]
    fn test_number_length_bounds() {
        assert!(normalize_number(&"4".repeat(11)).is_none());
        assert!(normalize_number(&"4".repeat(12)).is_some());
        assert!(normalize_number(&"4".repeat(19)).is_some());
        assert!(normalize_number(&"4".repeat(20)).is_none());
        assert!(normalize_number("4242x42424242424").is_none());
    }

    #[test]
    fn test_debug_redacts_number_and_cvv() {
        let input = card("4242424242424242", "12/29", "123");
        let debug = format!("{input:?}");
        assert!(!debug.contains("4242"));
        assert!(!debug.contains("123"));
    }
}
