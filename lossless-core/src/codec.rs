//! Conversions between field types and tree values.
//!
//! By default a field converts through its own `serde` implementation,
//! reading straight from the borrowed tree value. Fields whose type has no
//! suitable `serde` form, or whose document form differs from it, can name
//! a hook module with `#[lossless(with = "path")]`; the module provides:
//!
//! ```ignore
//! pub fn from_value(value: &serde_json::Value) -> Result<T, serde_json::Error>;
//! pub fn to_value(value: &T) -> Result<serde_json::Value, serde_json::Error>;
//! ```
//!
//! The modules under [`with`] cover common cases.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decodes a field value directly from a tree value.
///
/// A float with no fractional part (`42.0`, `4.2e1`) also decodes into an
/// integer type.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(value).or_else(|err| match integral(value) {
        Some(whole) => T::deserialize(&whole).map_err(|_| err),
        None => Err(err),
    })
}

/// The integer form of a whole float, if it has one.
fn integral(value: &Value) -> Option<Value> {
    let Value::Number(number) = value else {
        return None;
    };
    if !number.is_f64() {
        return None;
    }
    let float = number.as_f64()?;
    if !float.is_finite() || float.fract() != 0.0 {
        return None;
    }
    if (0.0..U64_BOUND).contains(&float) {
        Some(Value::from(float as u64))
    } else if (I64_MIN..0.0).contains(&float) {
        Some(Value::from(float as i64))
    } else {
        None
    }
}

const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;

/// Encodes a field value into a tree value.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

/// Hook modules for `#[lossless(with = "...")]`.
pub mod with {
    /// `chrono::DateTime<Utc>` stored as whole seconds since the Unix epoch.
    pub mod unix_seconds {
        use chrono::{DateTime, Utc};
        use serde::de::Error as _;
        use serde_json::Value;

        pub fn from_value(value: &Value) -> Result<DateTime<Utc>, serde_json::Error> {
            let seconds: i64 = crate::codec::decode(value)?;
            DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
                serde_json::Error::custom(format!("timestamp {seconds} is out of range"))
            })
        }

        pub fn to_value(value: &DateTime<Utc>) -> Result<Value, serde_json::Error> {
            Ok(Value::from(value.timestamp()))
        }
    }

    /// Any `Display + FromStr` type stored as a string.
    ///
    /// Numbers and booleans are accepted on input through their textual
    /// form, so `"42"` and `42` both decode.
    pub mod display {
        use std::borrow::Cow;
        use std::fmt::Display;
        use std::str::FromStr;

        use serde::de::Error as _;
        use serde_json::Value;

        use crate::tree;

        pub fn from_value<T>(value: &Value) -> Result<T, serde_json::Error>
        where
            T: FromStr,
            T::Err: Display,
        {
            let text = match value {
                Value::String(text) => Cow::Borrowed(text.as_str()),
                Value::Number(number) => Cow::Owned(number.to_string()),
                Value::Bool(flag) => Cow::Owned(flag.to_string()),
                other => {
                    return Err(serde_json::Error::custom(format!(
                        "expected a string, found {}",
                        tree::kind(other)
                    )));
                }
            };
            text.parse().map_err(serde_json::Error::custom)
        }

        pub fn to_value<T: Display>(value: &T) -> Result<Value, serde_json::Error> {
            Ok(Value::String(value.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::net::Ipv4Addr;

    #[test]
    fn decode_matching_type() {
        let name: String = decode(&json!("Jack")).unwrap();
        assert_eq!(name, "Jack");
        let age: u32 = decode(&json!(42)).unwrap();
        assert_eq!(age, 42);
    }

    #[test]
    fn decode_reconciles_timestamp_string() {
        let at: DateTime<Utc> = decode(&json!("2013-09-16T10:44:40.295451647-00:00")).unwrap();
        assert_eq!(
            at,
            Utc.with_ymd_and_hms(2013, 9, 16, 10, 44, 40).unwrap()
                + chrono::Duration::nanoseconds(295_451_647)
        );
    }

    #[test]
    fn decode_rejects_wrong_type() {
        assert!(decode::<u32>(&json!("forty-two")).is_err());
        assert!(decode::<DateTime<Utc>>(&json!("yesterday")).is_err());
    }

    #[test]
    fn decode_accepts_whole_floats_for_integers() {
        assert_eq!(decode::<u32>(&json!(42.0)).unwrap(), 42);
        assert_eq!(decode::<i64>(&json!(-3.0)).unwrap(), -3);
        assert_eq!(decode::<u8>(&json!(0.0)).unwrap(), 0);
        assert_eq!(decode::<f64>(&json!(42.0)).unwrap(), 42.0);
    }

    #[test]
    fn decode_rejects_fractional_and_out_of_range_floats() {
        assert!(decode::<u32>(&json!(4.2)).is_err());
        assert!(decode::<u8>(&json!(300.0)).is_err());
        assert!(decode::<u32>(&json!(-1.0)).is_err());
        assert!(decode::<u64>(&json!(1e20)).is_err());
    }

    #[test]
    fn unix_seconds_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let value = with::unix_seconds::to_value(&at).unwrap();
        assert_eq!(value, json!(1_709_208_000));
        assert_eq!(with::unix_seconds::from_value(&value).unwrap(), at);
        assert_eq!(
            with::unix_seconds::from_value(&json!(1_709_208_000.0)).unwrap(),
            at
        );
    }

    #[test]
    fn unix_seconds_rejects_strings() {
        assert!(with::unix_seconds::from_value(&json!("1709208000")).is_err());
    }

    #[test]
    fn display_accepts_strings_and_numbers() {
        let port: u16 = with::display::from_value(&json!("8080")).unwrap();
        assert_eq!(port, 8080);
        let port: u16 = with::display::from_value(&json!(8080)).unwrap();
        assert_eq!(port, 8080);
        let addr: Ipv4Addr = with::display::from_value(&json!("10.0.0.1")).unwrap();
        assert_eq!(with::display::to_value(&addr).unwrap(), json!("10.0.0.1"));
    }

    #[test]
    fn display_rejects_objects_and_bad_text() {
        assert!(with::display::from_value::<u16>(&json!({"port": 1})).is_err());
        assert!(with::display::from_value::<u16>(&json!("eighty")).is_err());
    }
}
