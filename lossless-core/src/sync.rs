//! Copying values between a record and its document tree.
//!
//! [`populate`] reads mapped keys from a tree into a record; [`flush`] writes
//! a record's fields back into a tree. Keys the record does not map are
//! never touched by either direction.

use std::any::type_name;

use log::{debug, trace};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::mapping;
use crate::record::Record;
use crate::tree;

/// Populates `record` from the object at the root of `tree`.
///
/// Each root key is resolved to a field (exact match, then case-insensitive
/// for identifier-keyed fields); unresolved keys are skipped and stay in the
/// tree. Fields without a matching key keep their current value. Nothing is
/// assigned unless every matched value decodes.
pub fn populate<R: Record>(record: &mut R, tree: &Value) -> Result<()> {
    let table = mapping::resolve::<R>()?;
    let object = tree.as_object().ok_or_else(|| Error::NotAnObject {
        found: tree::kind(tree),
    })?;

    let mut entries = Vec::with_capacity(table.len().min(object.len()));
    for (key, value) in object {
        match table.lookup(key) {
            Some(index) => entries.push((index, value)),
            None => trace!("retaining unmapped key {key:?}"),
        }
    }

    debug!(
        "populating {} from {} of {} key(s)",
        type_name::<R>(),
        entries.len(),
        object.len()
    );
    record.assign(&entries)
}

/// Writes every synced field of `record` into `tree`, in declaration order.
///
/// Each field is stored under its exact effective key, replacing whatever
/// was there. Every other key is left untouched, including keys that fed a
/// field through a case-insensitive match. A non-object root is replaced by
/// an empty object.
pub fn flush<R: Record>(record: &R, tree: &mut Value) -> Result<()> {
    let table = mapping::resolve::<R>()?;

    for (index, key) in table.output_keys() {
        let Some(value) = record.field_value(index)? else {
            continue;
        };
        trace!(
            "writing field `{}` to key {key:?}",
            table.ident(index).unwrap_or_default()
        );
        tree::set_key(tree, key, value);
    }
    Ok(())
}
