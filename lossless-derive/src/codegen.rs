use std::collections::HashMap;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{DeriveInput, Ident, Type};

use crate::{FieldAttrs, parse_container_attrs, parse_field_attrs};

/// One declared field, with its position in the descriptor table.
struct FieldSpec<'a> {
    index: usize,
    ident: &'a Ident,
    /// Identifier without any `r#` prefix; this is the default key.
    name: String,
    ty: &'a Type,
    attrs: FieldAttrs,
}

impl FieldSpec<'_> {
    fn key(&self) -> Option<String> {
        if self.attrs.excluded() {
            return None;
        }
        Some(
            self.attrs
                .rename
                .as_ref()
                .map(|rename| rename.value())
                .unwrap_or_else(|| self.name.clone()),
        )
    }

    /// Local holding the decoded value during staged assignment.
    fn slot(&self) -> Ident {
        format_ident!("__lossless_{}", self.ident)
    }

    fn index_lit(&self) -> Literal {
        Literal::usize_unsuffixed(self.index)
    }
}

/// Generates the `Record` impl, plus `serde` impls when requested.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let container = parse_container_attrs(&input.attrs)?;

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Record cannot be derived for types with lifetime parameters",
        ));
    }

    let specs = named_fields(input)?
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let ident = field.ident.as_ref().ok_or_else(|| {
                syn::Error::new_spanned(field, "Record fields must be named")
            })?;
            Ok::<_, syn::Error>(FieldSpec {
                index,
                ident,
                name: ident.unraw().to_string(),
                ty: &field.ty,
                attrs: parse_field_attrs(field)?,
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let overlay = find_overlay(name, &specs)?.ident;
    check_keys(&specs)?;

    let synced: Vec<&FieldSpec> = specs.iter().filter(|s| !s.attrs.excluded()).collect();
    let descriptors = specs.iter().map(generate_descriptor);
    let assign = generate_assign(&synced);
    let field_value = generate_field_value(&synced);

    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let where_clause = build_where_clause(&input.generics, &[]);

    let record_impl = quote! {
        impl #impl_generics ::lossless_core::Record for #name #ty_generics #where_clause {
            fn fields() -> &'static [::lossless_core::FieldDescriptor] {
                const FIELDS: &[::lossless_core::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn overlay(&self) -> &::lossless_core::Overlay {
                &self.#overlay
            }

            fn overlay_mut(&mut self) -> &mut ::lossless_core::Overlay {
                &mut self.#overlay
            }

            #assign
            #field_value
        }
    };

    let serde_impls = if container.serde {
        generate_serde(input)
    } else {
        quote! {}
    };

    Ok(quote! {
        #record_impl
        #serde_impls
    })
}

fn named_fields(
    input: &DeriveInput,
) -> syn::Result<&syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    match &input.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(named),
            ..
        }) => Ok(&named.named),
        syn::Data::Struct(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs with named fields",
        )),
        syn::Data::Enum(_) | syn::Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs",
        )),
    }
}

fn find_overlay<'s, 'a>(
    name: &Ident,
    specs: &'s [FieldSpec<'a>],
) -> syn::Result<&'s FieldSpec<'a>> {
    let mut overlays = specs.iter().filter(|s| s.attrs.overlay);
    let Some(overlay) = overlays.next() else {
        return Err(syn::Error::new_spanned(
            name,
            "Record needs one `Overlay` field marked #[lossless(overlay)]",
        ));
    };
    if let Some(extra) = overlays.next() {
        return Err(syn::Error::new_spanned(
            extra.ident,
            "only one field can be marked #[lossless(overlay)]",
        ));
    }
    Ok(overlay)
}

/// Rejects fields that would claim the same document key.
fn check_keys(specs: &[FieldSpec]) -> syn::Result<()> {
    let mut exact: HashMap<String, &Ident> = HashMap::new();
    let mut folded: HashMap<String, &Ident> = HashMap::new();

    for spec in specs {
        let Some(key) = spec.key() else {
            continue;
        };

        if let Some(first) = exact.insert(key.clone(), spec.ident) {
            return Err(syn::Error::new_spanned(
                spec.ident,
                format!("key {key:?} is already used by field `{first}`"),
            ));
        }

        if spec.attrs.rename.is_none() {
            if let Some(first) = folded.insert(spec.name.to_lowercase(), spec.ident) {
                return Err(syn::Error::new_spanned(
                    spec.ident,
                    format!("field name differs from field `{first}` only in case"),
                ));
            }
        }
    }

    Ok(())
}

fn generate_descriptor(spec: &FieldSpec) -> TokenStream {
    let name = &spec.name;
    if spec.attrs.excluded() {
        quote! { ::lossless_core::FieldDescriptor::excluded(#name) }
    } else if let Some(rename) = &spec.attrs.rename {
        quote! { ::lossless_core::FieldDescriptor::renamed(#name, #rename) }
    } else {
        quote! { ::lossless_core::FieldDescriptor::new(#name) }
    }
}

/// Decodes every entry into a local first, then moves the locals into the
/// fields, so a decode error leaves `self` untouched.
fn generate_assign(synced: &[&FieldSpec]) -> TokenStream {
    if synced.is_empty() {
        return quote! {
            fn assign(
                &mut self,
                entries: &[(usize, &::lossless_core::__private::serde_json::Value)],
            ) -> ::lossless_core::Result<()> {
                let _ = entries;
                ::core::result::Result::Ok(())
            }
        };
    }

    let slots: Vec<_> = synced.iter().map(|s| s.slot()).collect();
    let types: Vec<_> = synced.iter().map(|s| s.ty).collect();
    let indices: Vec<_> = synced.iter().map(|s| s.index_lit()).collect();
    let idents: Vec<_> = synced.iter().map(|s| s.ident).collect();
    let decodes: Vec<_> = synced
        .iter()
        .map(|s| {
            let name = &s.name;
            let decode = match &s.attrs.with {
                Some(with) => quote! { #with::from_value(value) },
                None => quote! { ::lossless_core::codec::decode(value) },
            };
            quote! {
                #decode.map_err(|source| ::lossless_core::Error::FieldTypeMismatch {
                    field: #name,
                    source,
                })?
            }
        })
        .collect();

    quote! {
        fn assign(
            &mut self,
            entries: &[(usize, &::lossless_core::__private::serde_json::Value)],
        ) -> ::lossless_core::Result<()> {
            #(
                let mut #slots: ::core::option::Option<#types> = ::core::option::Option::None;
            )*

            for &(index, value) in entries {
                match index {
                    #(
                        #indices => #slots = ::core::option::Option::Some(#decodes),
                    )*
                    _ => {}
                }
            }

            #(
                if let ::core::option::Option::Some(value) = #slots {
                    self.#idents = value;
                }
            )*

            ::core::result::Result::Ok(())
        }
    }
}

fn generate_field_value(synced: &[&FieldSpec]) -> TokenStream {
    if synced.is_empty() {
        return quote! {
            fn field_value(
                &self,
                index: usize,
            ) -> ::lossless_core::Result<
                ::core::option::Option<::lossless_core::__private::serde_json::Value>,
            > {
                let _ = index;
                ::core::result::Result::Ok(::core::option::Option::None)
            }
        };
    }

    let arms = synced.iter().map(|s| {
        let index = s.index_lit();
        let name = &s.name;
        let ident = s.ident;
        let encode = match &s.attrs.with {
            Some(with) => quote! { #with::to_value(&self.#ident) },
            None => quote! { ::lossless_core::codec::encode(&self.#ident) },
        };
        quote! { #index => (#name, #encode), }
    });

    quote! {
        fn field_value(
            &self,
            index: usize,
        ) -> ::lossless_core::Result<
            ::core::option::Option<::lossless_core::__private::serde_json::Value>,
        > {
            let (field, encoded) = match index {
                #(#arms)*
                _ => return ::core::result::Result::Ok(::core::option::Option::None),
            };
            encoded
                .map(::core::option::Option::Some)
                .map_err(|source| ::lossless_core::Error::FieldEncode { field, source })
        }
    }
}

fn generate_serde(input: &DeriveInput) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let ser_where = build_where_clause(&input.generics, &[]);

    let mut de_generics = input.generics.clone();
    de_generics.params.insert(0, syn::parse_quote!('de));
    let (de_impl_generics, _, _) = de_generics.split_for_impl();
    let de_where = build_where_clause(&input.generics, &[quote! { Self: ::core::default::Default }]);

    quote! {
        impl #impl_generics ::lossless_core::__private::serde::Serialize for #name #ty_generics #ser_where {
            fn serialize<__S>(&self, serializer: __S) -> ::core::result::Result<__S::Ok, __S::Error>
            where
                __S: ::lossless_core::__private::serde::Serializer,
            {
                ::lossless_core::serde_bridge::serialize(self, serializer)
            }
        }

        impl #de_impl_generics ::lossless_core::__private::serde::Deserialize<'de> for #name #ty_generics #de_where {
            fn deserialize<__D>(deserializer: __D) -> ::core::result::Result<Self, __D::Error>
            where
                __D: ::lossless_core::__private::serde::Deserializer<'de>,
            {
                ::lossless_core::serde_bridge::deserialize(deserializer)
            }
        }
    }
}

/// Combines the type's own where clause with the bounds every record type
/// parameter needs.
fn build_where_clause(generics: &syn::Generics, extra: &[TokenStream]) -> TokenStream {
    let existing = generics
        .where_clause
        .iter()
        .flat_map(|w| w.predicates.iter())
        .map(|predicate| quote! { #predicate });

    let bounds = generics.type_params().map(|p| {
        let ident = &p.ident;
        quote! {
            #ident: ::lossless_core::__private::serde::Serialize
                + ::lossless_core::__private::serde::de::DeserializeOwned
                + 'static
        }
    });

    let predicates: Vec<_> = existing.chain(bounds).chain(extra.iter().cloned()).collect();
    if predicates.is_empty() {
        return quote! {};
    }

    quote! {
        where
            #(#predicates),*
    }
}
