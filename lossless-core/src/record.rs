use std::any::type_name;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::descriptor::FieldDescriptor;
use crate::error::{Error, Result};
use crate::overlay::Overlay;
use crate::{sync, tree};

/// A typed record that round-trips through a JSON document without losing
/// the keys it does not declare.
///
/// The required methods describe the record's fields and give access to
/// its embedded [`Overlay`]; they are normally generated with
/// `#[derive(Record)]`. The provided methods are the decode/encode entry
/// points.
///
/// # Example
///
/// ```
/// use lossless_core::{Overlay, Record};
///
/// #[derive(Debug, Default, Record)]
/// struct Person {
///     #[lossless(overlay)]
///     overlay: Overlay,
///     name: String,
///     age: u32,
/// }
///
/// let mut person = Person::default();
/// person.decode(br#"{"Name": "Jack", "age": 42, "Extra": {"foo": "bar"}}"#).unwrap();
/// assert_eq!(person.name, "Jack");
///
/// person.age += 1;
/// let out = person.encode().unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     r#"{"Name":"Jack","age":43,"Extra":{"foo":"bar"},"name":"Jack"}"#
/// );
/// ```
pub trait Record: Sized + 'static {
    /// Declared fields in declaration order, including excluded ones.
    fn fields() -> &'static [FieldDescriptor];

    fn overlay(&self) -> &Overlay;

    fn overlay_mut(&mut self) -> &mut Overlay;

    /// Decodes `(field index, value)` pairs into the record's fields.
    ///
    /// Implementations must decode every entry before overwriting any
    /// field, so a failing entry leaves the record unchanged. Later entries
    /// for the same index take precedence. Unknown indices are ignored.
    fn assign(&mut self, entries: &[(usize, &Value)]) -> Result<()>;

    /// Encodes the field at `index`, or `None` if it is not synced.
    fn field_value(&self, index: usize) -> Result<Option<Value>>;

    /// Parses `bytes` and populates the record from it, retaining the whole
    /// document in the overlay. On error neither the record nor its overlay
    /// is modified.
    fn decode(&mut self, bytes: &[u8]) -> Result<()> {
        let tree: Value = serde_json::from_slice(bytes).map_err(Error::MalformedDocument)?;
        self.decode_value(tree)
    }

    /// Populates the record from an already parsed tree and retains it.
    fn decode_value(&mut self, tree: Value) -> Result<()> {
        debug!("decoding {}", type_name::<Self>());
        sync::populate(self, &tree)?;
        self.overlay_mut().attach(tree);
        Ok(())
    }

    /// Builds a record from its default value and a document.
    fn from_slice(bytes: &[u8]) -> Result<Self>
    where
        Self: Default,
    {
        let mut record = Self::default();
        record.decode(bytes)?;
        Ok(record)
    }

    /// Writes the record's fields into the retained tree and serializes it.
    fn encode(&mut self) -> Result<Vec<u8>> {
        let tree = flush_retained(self)?;
        serde_json::to_vec(tree).map_err(Error::Encode)
    }

    /// Like [`encode`](Record::encode), with indented output.
    fn encode_pretty(&mut self) -> Result<Vec<u8>> {
        let tree = flush_retained(self)?;
        serde_json::to_vec_pretty(tree).map_err(Error::Encode)
    }

    /// The tree `encode` would serialize, without touching the overlay.
    fn snapshot(&self) -> Result<Value> {
        let mut tree = self.overlay().tree().cloned().unwrap_or_else(tree::empty);
        sync::flush(self, &mut tree)?;
        Ok(tree)
    }

    /// Injects `value` at a nested path of the retained tree.
    ///
    /// Keys owned by a record field are overwritten by the field's value
    /// on the next encode.
    fn set<I, K, V>(&mut self, path: I, value: &V) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        V: Serialize + ?Sized,
    {
        self.overlay_mut().set(path, value)
    }

    /// Dynamic form of [`set`](Record::set); see [`tree::set`].
    fn set_args(&mut self, args: Vec<Value>) -> Result<()> {
        self.overlay_mut().set_args(args)
    }
}

/// Flushes the record into its overlay's tree and returns the tree.
///
/// The tree is detached for the duration of the flush so the record can be
/// read while its tree is written; it is reattached even if a field fails
/// to encode.
fn flush_retained<R: Record>(record: &mut R) -> Result<&Value> {
    debug!("encoding {}", type_name::<R>());
    let mut tree = record.overlay_mut().detach().unwrap_or_else(tree::empty);
    let flushed = sync::flush(&*record, &mut tree);
    let overlay = record.overlay_mut();
    overlay.attach(tree);
    flushed?;
    Ok(&*overlay.tree_mut())
}
