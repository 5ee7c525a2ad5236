//! Lossless round-tripping between typed records and JSON documents.
//!
//! A record declares only the fields it cares about. Decoding a document
//! fills those fields and keeps the whole document in the record's
//! [`Overlay`]; encoding writes the current field values back into that
//! document, so keys the record never declared come out unchanged.
//!
//! Core concepts:
//! - **Record**: a struct whose fields are synced with a document
//! - **Overlay**: the document tree retained by one record instance
//! - **MappingTable**: which document key feeds which field, built once per type
//! - **Path setter**: injects extra values at nested paths of the tree
//!
//! # Example
//!
//! ```
//! use lossless_core::{Overlay, Record};
//! use serde_json::json;
//!
//! #[derive(Debug, Default, Record)]
//! struct Person {
//!     #[lossless(overlay)]
//!     overlay: Overlay,
//!     name: String,
//!     age: u32,
//!     #[lossless(skip)]
//!     cached: bool,
//! }
//!
//! let mut person = Person::from_slice(br#"{"name": "Jack", "age": 42, "cached": true}"#).unwrap();
//! assert!(!person.cached);
//!
//! person.age += 1;
//! lossless_core::set!(person, "meta", "source", "import").unwrap();
//!
//! let out: serde_json::Value = serde_json::from_slice(&person.encode().unwrap()).unwrap();
//! assert_eq!(
//!     out,
//!     json!({"name": "Jack", "age": 43, "cached": true, "meta": {"source": "import"}})
//! );
//! ```
//!
//! # Key resolution
//!
//! A field is keyed by its identifier unless it carries
//! `#[lossless(rename = "...")]`. Identifier keys also match document keys
//! that differ only in case when decoding; encoding always uses the exact
//! key. Fields marked `#[lossless(skip)]` are never read or written.

pub mod codec;
mod descriptor;
mod error;
pub mod mapping;
mod overlay;
mod record;
pub mod serde_bridge;
pub mod sync;
pub mod tree;

pub use descriptor::{Directive, FieldDescriptor};
pub use error::{Error, Result};
pub use mapping::MappingTable;
pub use overlay::Overlay;
pub use record::Record;

#[cfg(feature = "derive")]
pub use lossless_derive::Record;

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}

/// Sets a value at a nested path of a record's (or overlay's) tree.
///
/// Every argument but the last is a path key; the last is the value. Each
/// argument goes through `serde_json::json!`, and the call returns
/// [`Error::InvalidPathArgument`] if a path key is not a string or fewer
/// than two arguments are given.
///
/// ```
/// use lossless_core::{Overlay, set};
///
/// let mut overlay = Overlay::new();
/// set!(overlay, "a", "b", "c", 1).unwrap();
/// set!(overlay, "a", "b", "d", 2).unwrap();
/// assert_eq!(overlay.get(["a", "b", "d"]), Some(&serde_json::json!(2)));
/// ```
#[macro_export]
macro_rules! set {
    ($target:expr $(, $arg:expr)* $(,)?) => {
        $target.set_args(::std::vec![$($crate::__private::serde_json::json!($arg)),*])
    };
}
