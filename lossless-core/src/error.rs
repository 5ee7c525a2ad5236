/// Result type alias for overlay operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while syncing a record with its document tree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input bytes are not a valid JSON document.
    #[error("malformed document: {0}")]
    MalformedDocument(#[source] serde_json::Error),

    /// A record can only be decoded from an object-rooted document.
    #[error("expected an object at the document root, found {found}")]
    NotAnObject { found: &'static str },

    /// A document value could not be converted into the field's type.
    #[error("field `{field}` could not be decoded: {source}")]
    FieldTypeMismatch {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A path setter call had a non-string segment or too few arguments.
    #[error("invalid path argument: {0}")]
    InvalidPathArgument(String),

    /// Two fields of one record type claim the same document key.
    #[error("fields `{first}` and `{second}` both map to key {key:?}")]
    DuplicateKey {
        key: String,
        first: &'static str,
        second: &'static str,
    },

    /// A field value could not be converted into a tree value.
    #[error("field `{field}` could not be encoded: {source}")]
    FieldEncode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The tree, or a value being injected into it, failed to serialize.
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_path(message: impl Into<String>) -> Self {
        Error::InvalidPathArgument(message.into())
    }
}
