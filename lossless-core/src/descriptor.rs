/// How a record field maps onto a document key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Use the field identifier as the key. Decoding also accepts keys
    /// that differ from it only in case.
    Ident,
    /// Use an explicit key, matched exactly.
    Rename(&'static str),
    /// Never read from or written to the document.
    Exclude,
}

/// Static description of one declared record field.
///
/// A record type exposes its fields as a `&'static [FieldDescriptor]` in
/// declaration order; the index of a descriptor in that slice is the field
/// index used by [`Record::assign`](crate::Record::assign) and
/// [`Record::field_value`](crate::Record::field_value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub ident: &'static str,
    pub directive: Directive,
}

impl FieldDescriptor {
    /// A field keyed by its identifier.
    pub const fn new(ident: &'static str) -> Self {
        FieldDescriptor {
            ident,
            directive: Directive::Ident,
        }
    }

    /// A field keyed by an explicit name.
    pub const fn renamed(ident: &'static str, key: &'static str) -> Self {
        FieldDescriptor {
            ident,
            directive: Directive::Rename(key),
        }
    }

    /// A field that never takes part in synchronization.
    pub const fn excluded(ident: &'static str) -> Self {
        FieldDescriptor {
            ident,
            directive: Directive::Exclude,
        }
    }

    /// Returns the key this field is written under, or `None` if excluded.
    pub fn effective_key(&self) -> Option<&'static str> {
        match self.directive {
            Directive::Ident => Some(self.ident),
            Directive::Rename(key) => Some(key),
            Directive::Exclude => None,
        }
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self.directive, Directive::Exclude)
    }
}
