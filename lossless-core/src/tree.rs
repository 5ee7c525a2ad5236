//! Path-based access to a document tree.
//!
//! Setting a value at a nested path creates any missing intermediate objects
//! on the way down and never disturbs sibling keys, so repeated calls build
//! up structure incrementally:
//!
//! ```
//! use lossless_core::tree;
//! use serde_json::json;
//!
//! let mut doc = json!({});
//! tree::set_path(&mut doc, ["a", "b", "c"], json!(1)).unwrap();
//! tree::set_path(&mut doc, ["a", "b", "d"], json!(2)).unwrap();
//! assert_eq!(doc, json!({"a": {"b": {"c": 1, "d": 2}}}));
//! ```

use log::trace;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Returns a fresh empty object.
pub fn empty() -> Value {
    Value::Object(Map::new())
}

/// Name of a value's JSON type, for error messages.
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Sets a value from a dynamic argument list: every argument but the last
/// is a path key and must be a string; the last is the value.
///
/// Fails with [`Error::InvalidPathArgument`] when fewer than two arguments
/// are given or a path key is not a string. The tree is not modified on
/// failure.
pub fn set(tree: &mut Value, mut args: Vec<Value>) -> Result<()> {
    let count = args.len();
    let value = match args.pop() {
        Some(value) if count >= 2 => value,
        _ => {
            return Err(Error::invalid_path(format!(
                "expected a path and a value, got {count} argument(s)"
            )));
        }
    };

    let path = args
        .into_iter()
        .enumerate()
        .map(|(position, arg)| match arg {
            Value::String(key) => Ok(key),
            other => Err(Error::invalid_path(format!(
                "path key {position} must be a string, found {}",
                kind(&other)
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    set_path(tree, path, value)
}

/// Sets `value` at `path`, creating intermediate objects as needed.
///
/// An existing non-object value on the way down is replaced by an empty
/// object. Fails with [`Error::InvalidPathArgument`] on an empty path.
pub fn set_path<I, K>(tree: &mut Value, path: I, value: Value) -> Result<()>
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    let mut path: Vec<String> = path.into_iter().map(Into::into).collect();
    let Some(last) = path.pop() else {
        return Err(Error::invalid_path("path must contain at least one key"));
    };

    trace!("setting key {last:?} under {path:?}");

    let mut node = tree;
    for key in path {
        node = object_mut(node).entry(key).or_insert_with(empty);
    }
    object_mut(node).insert(last, value);
    Ok(())
}

/// Single-level set: `tree[key] = value`, leaving other keys untouched.
pub fn set_key(tree: &mut Value, key: impl Into<String>, value: Value) {
    object_mut(tree).insert(key.into(), value);
}

/// Walks `path` through nested objects.
pub fn get<'a, I, K>(tree: &'a Value, path: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    path.into_iter()
        .try_fold(tree, |node, key| node.as_object()?.get(key.as_ref()))
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = empty();
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}
