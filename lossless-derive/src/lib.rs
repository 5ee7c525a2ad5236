use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod codegen;

/// Derive macro for the `Record` trait.
///
/// Generates the field descriptor table, staged field assignment and field
/// encoding for a struct with named fields. Exactly one field must hold the
/// record's `Overlay` and be marked `#[lossless(overlay)]`.
///
/// # Example
///
/// ```ignore
/// use lossless_core::{Overlay, Record};
///
/// #[derive(Default, Record)]
/// struct Person {
///     #[lossless(overlay)]
///     overlay: Overlay,
///     #[lossless(rename = "fullName")]
///     name: String,
///     age: u32,
/// }
/// ```
///
/// # Attributes
///
/// Field level:
/// - `#[lossless(overlay)]` - The field holding the record's overlay (never synced)
/// - `#[lossless(skip)]` - Never read from or written to the document
/// - `#[lossless(rename = "key")]` - Use an explicit document key, matched exactly
/// - `#[lossless(with = "module")]` - Convert through `module::from_value` / `module::to_value`
///
/// Container level:
/// - `#[lossless(serde)]` - Also implement `serde::Serialize` and `serde::Deserialize`
///   (the latter requires `Default`)
#[proc_macro_derive(Record, attributes(lossless))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub overlay: bool,
    pub skip: bool,
    pub rename: Option<syn::LitStr>,
    pub with: Option<syn::Path>,
}

impl FieldAttrs {
    /// Overlay fields are excluded like skipped ones.
    pub fn excluded(&self) -> bool {
        self.overlay || self.skip
    }
}

pub(crate) fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("lossless") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("overlay") {
                result.overlay = true;
            } else if meta.path.is_ident("skip") {
                result.skip = true;
            } else if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.rename = Some(value);
            } else if meta.path.is_ident("with") {
                let value: syn::LitStr = meta.value()?.parse()?;
                result.with = Some(value.parse()?);
            } else {
                return Err(meta.error("unknown lossless field attribute"));
            }
            Ok(())
        })?;
    }

    if result.excluded() {
        if let Some(rename) = &result.rename {
            return Err(syn::Error::new_spanned(
                rename,
                "`rename` has no effect on a field that is never synced",
            ));
        }
        if let Some(with) = &result.with {
            return Err(syn::Error::new_spanned(
                with,
                "`with` has no effect on a field that is never synced",
            ));
        }
    }

    Ok(result)
}

#[derive(Default)]
pub(crate) struct ContainerAttrs {
    pub serde: bool,
}

pub(crate) fn parse_container_attrs(attrs: &[syn::Attribute]) -> syn::Result<ContainerAttrs> {
    let mut result = ContainerAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("lossless") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("serde") {
                result.serde = true;
                Ok(())
            } else {
                Err(meta.error("unknown lossless container attribute"))
            }
        })?;
    }

    Ok(result)
}
