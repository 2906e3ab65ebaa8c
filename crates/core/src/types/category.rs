//! Product categories.
//!
//! The catalog uses a closed list of display strings. They are stored verbatim
//! in `shop.product.category` and sent verbatim over the wire.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a string is not one of the known categories.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownCategory(pub String);

/// A product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductCategory {
    BluetoothSpeakers,
    Headphones,
    WirelessEarbuds,
    Smartwatches,
    ScreenProtectors,
    PhoneCases,
    ChargersAndCables,
    PowerBanks,
    Accessories,
    Wearables,
    BudgetPhones,
    FlagshipPhones,
    GamingPhones,
    Tablets,
}

impl ProductCategory {
    /// Every category, in catalog display order.
    pub const ALL: [Self; 14] = [
        Self::BluetoothSpeakers,
        Self::Headphones,
        Self::WirelessEarbuds,
        Self::Smartwatches,
        Self::ScreenProtectors,
        Self::PhoneCases,
        Self::ChargersAndCables,
        Self::PowerBanks,
        Self::Accessories,
        Self::Wearables,
        Self::BudgetPhones,
        Self::FlagshipPhones,
        Self::GamingPhones,
        Self::Tablets,
    ];

    /// The display string, which is also the stored and wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BluetoothSpeakers => "Bluetooth Speakers",
            Self::Headphones => "Headphones",
            Self::WirelessEarbuds => "Wireless Earbuds",
            Self::Smartwatches => "Smartwatches",
            Self::ScreenProtectors => "Screen Protectors",
            Self::PhoneCases => "Phone Cases",
            Self::ChargersAndCables => "Chargers & Cables",
            Self::PowerBanks => "Power Banks",
            Self::Accessories => "Accessories",
            Self::Wearables => "Wearables",
            Self::BudgetPhones => "Budget Phones",
            Self::FlagshipPhones => "Flagship Phones",
            Self::GamingPhones => "Gaming Phones",
            Self::Tablets => "Tablets",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProductCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ProductCategory {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ProductCategory {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ProductCategory {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
