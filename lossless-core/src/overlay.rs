use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::tree;

/// The document tree retained alongside a record.
///
/// An overlay starts out detached. It becomes attached either when a
/// document is decoded into its record (the parsed tree is kept wholesale)
/// or when a value is first set or the record is first encoded (an empty
/// object is created). Keys the record does not declare live only here and
/// survive every decode/encode cycle untouched.
///
/// Embed one in a record type and mark it `#[lossless(overlay)]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    tree: Option<Value>,
}

impl Overlay {
    /// Creates a detached overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a tree has been created or decoded.
    pub fn is_attached(&self) -> bool {
        self.tree.is_some()
    }

    /// The retained tree, if attached.
    pub fn tree(&self) -> Option<&Value> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<Value> {
        self.tree
    }

    /// Replaces the retained tree, discarding everything previously held.
    pub fn attach(&mut self, tree: Value) {
        self.tree = Some(tree);
    }

    /// Removes the retained tree, leaving the overlay detached.
    pub fn detach(&mut self) -> Option<Value> {
        self.tree.take()
    }

    /// The retained tree, created as `{}` if detached.
    pub fn tree_mut(&mut self) -> &mut Value {
        self.tree.get_or_insert_with(tree::empty)
    }

    /// Reads the value at a nested path.
    pub fn get<I, K>(&self, path: I) -> Option<&Value>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        tree::get(self.tree.as_ref()?, path)
    }

    /// Sets `value` at a nested path, creating intermediate objects.
    pub fn set<I, K, V>(&mut self, path: I, value: &V) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        V: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).map_err(Error::Encode)?;
        tree::set_path(self.tree_mut(), path, value)
    }

    /// Sets a value from a dynamic argument list; see [`tree::set`].
    pub fn set_args(&mut self, args: Vec<Value>) -> Result<()> {
        tree::set(self.tree_mut(), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_detached() {
        let overlay = Overlay::new();
        assert!(!overlay.is_attached());
        assert_eq!(overlay.tree(), None);
        assert_eq!(overlay.get(["anything"]), None);
    }

    #[test]
    fn set_attaches_empty_object() {
        let mut overlay = Overlay::new();
        overlay.set(["pi"], &3.14159).unwrap();
        assert!(overlay.is_attached());
        assert_eq!(overlay.tree(), Some(&json!({"pi": 3.14159})));
    }

    #[test]
    fn set_accumulates() {
        let mut overlay = Overlay::new();
        overlay.set(["meta", "source"], "import").unwrap();
        overlay.set(["meta", "version"], &2).unwrap();
        overlay.set_args(vec![json!("flag"), json!(true)]).unwrap();
        assert_eq!(
            overlay.into_tree(),
            Some(json!({"meta": {"source": "import", "version": 2}, "flag": true}))
        );
    }

    #[test]
    fn attach_replaces_previous_tree() {
        let mut overlay = Overlay::new();
        overlay.set(["old"], &1).unwrap();
        overlay.attach(json!({"new": 2}));
        assert_eq!(overlay.get(["old"]), None);
        assert_eq!(overlay.get(["new"]), Some(&json!(2)));
    }

    #[test]
    fn detach_returns_tree() {
        let mut overlay = Overlay::new();
        overlay.attach(json!({"a": 1}));
        assert_eq!(overlay.detach(), Some(json!({"a": 1})));
        assert!(!overlay.is_attached());
    }

    #[test]
    fn invalid_args_leave_tree_empty() {
        let mut overlay = Overlay::new();
        assert!(matches!(
            overlay.set_args(vec![json!("only")]),
            Err(Error::InvalidPathArgument(_))
        ));
        assert_eq!(overlay.tree(), Some(&json!({})));
    }
}
