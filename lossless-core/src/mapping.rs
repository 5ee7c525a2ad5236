//! Resolution of document keys to record fields.
//!
//! A [`MappingTable`] is derived from a record type's field descriptors and
//! answers two questions:
//! - which field (if any) does a document key feed when decoding, and
//! - under which exact key is a field written when encoding.
//!
//! Decoding is tolerant of case for fields keyed by their identifier;
//! encoding always uses the exact effective key. Tables are built once per
//! type and shared process-wide through [`resolve`].

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use indexmap::IndexMap;
use log::debug;

use crate::descriptor::{Directive, FieldDescriptor};
use crate::error::{Error, Result};
use crate::record::Record;

/// Bidirectional key/field lookup for one record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    exact: IndexMap<&'static str, usize>,
    folded: IndexMap<String, usize>,
    output: Vec<Option<&'static str>>,
    idents: Vec<&'static str>,
}

impl MappingTable {
    /// Builds the table for a list of fields in declaration order.
    ///
    /// Fails with [`Error::DuplicateKey`] when two fields share an effective
    /// key, or when two identifier-keyed fields differ only in case.
    pub fn build(fields: &[FieldDescriptor]) -> Result<Self> {
        let mut table = MappingTable {
            exact: IndexMap::with_capacity(fields.len()),
            folded: IndexMap::new(),
            output: Vec::with_capacity(fields.len()),
            idents: Vec::with_capacity(fields.len()),
        };

        for (index, field) in fields.iter().enumerate() {
            table.idents.push(field.ident);

            let Some(key) = field.effective_key() else {
                table.output.push(None);
                continue;
            };

            if let Some(&other) = table.exact.get(key) {
                return Err(Error::DuplicateKey {
                    key: key.to_string(),
                    first: fields[other].ident,
                    second: field.ident,
                });
            }
            table.exact.insert(key, index);

            if field.directive == Directive::Ident {
                let folded = field.ident.to_lowercase();
                if let Some(&other) = table.folded.get(&folded) {
                    return Err(Error::DuplicateKey {
                        key: folded,
                        first: fields[other].ident,
                        second: field.ident,
                    });
                }
                table.folded.insert(folded, index);
            }

            table.output.push(Some(key));
        }

        Ok(table)
    }

    /// Finds the field fed by a document key: exact match first, then a
    /// case-insensitive match against identifier-keyed fields.
    pub fn lookup(&self, key: &str) -> Option<usize> {
        if let Some(&index) = self.exact.get(key) {
            return Some(index);
        }
        if self.folded.is_empty() {
            return None;
        }
        self.folded.get(&key.to_lowercase()).copied()
    }

    /// The exact key a field is written under, or `None` if excluded.
    pub fn output_key(&self, index: usize) -> Option<&'static str> {
        self.output.get(index).copied().flatten()
    }

    /// Iterates `(field index, output key)` for every synced field in
    /// declaration order.
    pub fn output_keys(&self) -> impl Iterator<Item = (usize, &'static str)> + '_ {
        self.output
            .iter()
            .enumerate()
            .filter_map(|(index, key)| key.map(|key| (index, key)))
    }

    /// The identifier of the field at `index`.
    pub fn ident(&self, index: usize) -> Option<&'static str> {
        self.idents.get(index).copied()
    }

    /// Number of synced (non-excluded) fields.
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

type Registry = RwLock<HashMap<TypeId, Arc<MappingTable>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Returns the mapping table for `R`, building and caching it on first use.
///
/// Tables never change once inserted, so a poisoned lock is still safe to
/// read through.
pub fn resolve<R: Record>() -> Result<Arc<MappingTable>> {
    let registry = REGISTRY.get_or_init(Registry::default);
    let id = TypeId::of::<R>();

    if let Some(table) = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return Ok(Arc::clone(table));
    }

    let table = Arc::new(MappingTable::build(R::fields())?);
    debug!(
        "resolved {} synced field(s) for {}",
        table.len(),
        type_name::<R>()
    );

    let mut registry = registry.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(registry.entry(id).or_insert(table)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Overlay;
    use serde_json::Value;

    const PERSON: &[FieldDescriptor] = &[
        FieldDescriptor::excluded("overlay"),
        FieldDescriptor::renamed("Name", "name"),
        FieldDescriptor::renamed("Age", "age"),
        FieldDescriptor::new("Address"),
        FieldDescriptor::new("CreatedAt"),
        FieldDescriptor::excluded("Ignored"),
    ];

    #[test]
    fn empty_fields_give_empty_table() {
        let table = MappingTable::build(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.lookup("anything"), None);
        assert_eq!(table.output_keys().count(), 0);
    }

    #[test]
    fn renamed_fields_match_exactly() {
        let table = MappingTable::build(PERSON).unwrap();
        assert_eq!(table.lookup("name"), Some(1));
        assert_eq!(table.lookup("age"), Some(2));
        // renamed keys get no case folding
        assert_eq!(table.lookup("Age"), None);
        assert_eq!(table.lookup("AGE"), None);
    }

    #[test]
    fn ident_fields_fall_back_to_case_insensitive() {
        let table = MappingTable::build(PERSON).unwrap();
        assert_eq!(table.lookup("Address"), Some(3));
        assert_eq!(table.lookup("address"), Some(3));
        assert_eq!(table.lookup("ADDRESS"), Some(3));
        assert_eq!(table.lookup("createdat"), Some(4));
    }

    #[test]
    fn excluded_fields_are_invisible() {
        let table = MappingTable::build(PERSON).unwrap();
        assert_eq!(table.lookup("Ignored"), None);
        assert_eq!(table.lookup("ignored"), None);
        assert_eq!(table.lookup("overlay"), None);
        assert_eq!(table.output_key(0), None);
        assert_eq!(table.output_key(5), None);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn output_keys_use_exact_case_in_declaration_order() {
        let table = MappingTable::build(PERSON).unwrap();
        let keys: Vec<_> = table.output_keys().collect();
        assert_eq!(
            keys,
            vec![(1, "name"), (2, "age"), (3, "Address"), (4, "CreatedAt")]
        );
        assert_eq!(table.ident(4), Some("CreatedAt"));
    }

    #[test]
    fn exact_match_wins_over_folded() {
        let fields = [
            FieldDescriptor::new("id"),
            FieldDescriptor::renamed("legacy_id", "ID"),
        ];
        let table = MappingTable::build(&fields).unwrap();
        assert_eq!(table.lookup("ID"), Some(1));
        assert_eq!(table.lookup("Id"), Some(0));
        assert_eq!(table.lookup("id"), Some(0));
    }

    #[test]
    fn duplicate_effective_key_is_rejected() {
        let fields = [
            FieldDescriptor::new("name"),
            FieldDescriptor::renamed("alias", "name"),
        ];
        match MappingTable::build(&fields) {
            Err(Error::DuplicateKey { key, first, second }) => {
                assert_eq!(key, "name");
                assert_eq!(first, "name");
                assert_eq!(second, "alias");
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn case_colliding_idents_are_rejected() {
        let fields = [FieldDescriptor::new("url"), FieldDescriptor::new("URL")];
        assert!(matches!(
            MappingTable::build(&fields),
            Err(Error::DuplicateKey { .. })
        ));
    }

    #[test]
    fn excluded_fields_do_not_collide() {
        let fields = [
            FieldDescriptor::excluded("name"),
            FieldDescriptor::renamed("display", "name"),
        ];
        let table = MappingTable::build(&fields).unwrap();
        assert_eq!(table.lookup("name"), Some(1));
    }

    #[derive(Default)]
    struct Cached {
        overlay: Overlay,
    }

    impl Record for Cached {
        fn fields() -> &'static [FieldDescriptor] {
            PERSON
        }

        fn overlay(&self) -> &Overlay {
            &self.overlay
        }

        fn overlay_mut(&mut self) -> &mut Overlay {
            &mut self.overlay
        }

        fn assign(&mut self, _entries: &[(usize, &Value)]) -> Result<()> {
            Ok(())
        }

        fn field_value(&self, _index: usize) -> Result<Option<Value>> {
            Ok(None)
        }
    }

    #[test]
    fn resolve_caches_per_type() {
        let first = resolve::<Cached>().unwrap();
        let second = resolve::<Cached>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lookup("address"), Some(3));
    }
}
