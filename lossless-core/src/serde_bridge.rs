//! `serde` integration for records.
//!
//! `#[lossless(serde)]` makes the derive emit `Serialize` and `Deserialize`
//! implementations that call into this module, so a record can be handed
//! to any `serde` format or nested inside other `serde` types while still
//! carrying its unmapped keys.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::record::Record;

/// Serializes the record's retained tree with its current field values.
pub fn serialize<R, S>(record: &R, serializer: S) -> Result<S::Ok, S::Error>
where
    R: Record,
    S: Serializer,
{
    record
        .snapshot()
        .map_err(S::Error::custom)?
        .serialize(serializer)
}

/// Deserializes a document into a default record, retaining the document.
pub fn deserialize<'de, R, D>(deserializer: D) -> Result<R, D::Error>
where
    R: Record + Default,
    D: Deserializer<'de>,
{
    let tree = Value::deserialize(deserializer)?;
    let mut record = R::default();
    record.decode_value(tree).map_err(D::Error::custom)?;
    Ok(record)
}
