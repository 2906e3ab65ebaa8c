//! Order-level enums and constants.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Status given to orders and order items when they are placed.
pub const ORDER_PLACED: &str = "Order placed";

/// Maximum length of an order or order item status string.
pub const MAX_STATUS_LENGTH: usize = 50;

/// Error returned for an unrecognized payment method.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownPaymentMethod(pub String);

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Credit or debit card. Requires card details on the order.
    Card,
    /// `PayPal`.
    Paypal,
}

impl PaymentMethod {
    /// The wire and storage value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
        }
    }

    /// Whether orders paid this way must carry card details.
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::Card)
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::Paypal),
            other => Err(UnknownPaymentMethod(other.to_owned())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PaymentMethod {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PaymentMethod {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PaymentMethod {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("paypal".parse::<PaymentMethod>().unwrap(), PaymentMethod::Paypal);
        assert!("cash".parse::<PaymentMethod>().is_err());
        assert!("Card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_only_card_requires_card_details() {
        assert!(PaymentMethod::Card.requires_card());
        assert!(!PaymentMethod::Paypal.requires_card());
    }

    #[test]
    fn test_payment_method_serde() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Paypal).unwrap(), "\"paypal\"");
        let parsed: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Card);
    }
}
