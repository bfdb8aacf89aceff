//! Fixed-point hourly rate.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Sqlite, Type};

/// Fractional digits kept by a rate.
const SCALE: u32 = 2;

/// Largest storable rate, in cents.
const MAX_CENTS: i64 = 999_999;

/// Hourly rate, always carried with two fractional digits.
///
/// Serialized as a decimal string (`"25.00"`) so no precision is lost in
/// JSON clients, and stored as integer cents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    #[error("rate must be a decimal number")]
    Malformed,
    #[error("rate accepts at most 2 fractional digits")]
    Precision,
    #[error("rate must be between 0.00 and 9999.99")]
    OutOfRange,
}

impl Rate {
    /// Build a rate from cents.
    pub fn from_cents(cents: i64) -> Result<Self, RateError> {
        if (0..=MAX_CENTS).contains(&cents) {
            Ok(Self(Decimal::new(cents, SCALE)))
        } else {
            Err(RateError::OutOfRange)
        }
    }

    /// Rate in cents, as stored.
    pub fn cents(&self) -> i64 {
        // scale is pinned to 2 and the range checked on construction.
        self.0.mantissa() as i64
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(Decimal::new(0, SCALE))
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = RateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.scale() > SCALE {
            return Err(RateError::Precision);
        }
        if (value.is_sign_negative() && !value.is_zero()) || value > Decimal::new(MAX_CENTS, SCALE) {
            return Err(RateError::OutOfRange);
        }

        let mut value = value;
        value.rescale(SCALE);
        Ok(Self(value.abs()))
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl FromStr for Rate {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map_err(|_| RateError::Malformed)?
            .try_into()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Type<Sqlite> for Rate {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <i64 as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Rate {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<'q, Sqlite>>::encode(self.cents(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Rate {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let cents = <i64 as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Rate::from_cents(cents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rates() {
        assert_eq!("25".parse::<Rate>().unwrap().cents(), 2500);
        assert_eq!("25.5".parse::<Rate>().unwrap().cents(), 2550);
        assert_eq!("0.05".parse::<Rate>().unwrap().cents(), 5);
        assert_eq!("9999.99".parse::<Rate>().unwrap().cents(), 999_999);
        assert_eq!(" 12.30 ".parse::<Rate>().unwrap().to_string(), "12.30");
    }

    #[test]
    fn test_reject_rates() {
        assert_eq!("25.555".parse::<Rate>(), Err(RateError::Precision));
        assert_eq!("10000".parse::<Rate>(), Err(RateError::OutOfRange));
        assert_eq!("-3".parse::<Rate>(), Err(RateError::OutOfRange));
        assert_eq!("abc".parse::<Rate>(), Err(RateError::Malformed));
        assert_eq!(Rate::from_cents(1_000_000), Err(RateError::OutOfRange));
    }

    #[test]
    fn test_json_representation() {
        let rate: Rate = serde_json::from_str("\"42.10\"").unwrap();
        assert_eq!(serde_json::to_string(&rate).unwrap(), "\"42.10\"");

        let rate: Rate = serde_json::from_str("17.5").unwrap();
        assert_eq!(rate.to_string(), "17.50");

        let rate: Rate = serde_json::from_str("30").unwrap();
        assert_eq!(rate.cents(), 3000);

        assert_eq!(serde_json::to_string(&Rate::default()).unwrap(), "\"0.00\"");
        assert!(serde_json::from_str::<Rate>("-1").is_err());
        assert!(serde_json::from_str::<Rate>("\"20.125\"").is_err());
    }
}
