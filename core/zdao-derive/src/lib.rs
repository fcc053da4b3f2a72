//! zdao Derive — procedural macros for zdao.
//!
//! Provides `#[derive(Entity)]`, which replaces runtime reflection with a
//! generated descriptor and a static property accessor table.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Token, parse_macro_input};

/// Derive macro for entity metadata and property accessors.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, Entity)]
/// #[zdao(table = "t_member", sequence = "seq_member")]
/// pub struct Member {
///     #[zdao(pk, column)]
///     pub id: i64,
///     #[zdao(column = "USER_NAME")]
///     pub user_name: String,
///     #[zdao(column)]
///     pub age: Option<i32>,
///     #[zdao(transient)]
///     pub total: i64,
/// }
/// ```
///
/// Struct attributes: `table`, `sequence`, `index`, `index_pattern`,
/// `doc_type`, `keyspace`.
/// Field attributes: `pk`, `column`, `column = "name"`, `transient`,
/// `version`, `skip`.
///
/// Property names are the Rust field names.
///
/// Generates an `Entity` implementation:
/// - `descriptor()` → `EntityDescriptor`
/// - `get_value` / `set_value` → per-field match arms
#[proc_macro_derive(Entity, attributes(zdao))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct EntityAttrs {
    table: Option<String>,
    sequence: Option<String>,
    index: Option<String>,
    index_pattern: Option<String>,
    doc_type: Option<String>,
    keyspace: Option<String>,
}

enum Column {
    Missing,
    Derived,
    Named(String),
}

struct FieldAttrs {
    pk: bool,
    column: Column,
    transient: bool,
    version: bool,
    skip: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.to_string();
    let attrs = entity_attrs(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Entity can only be derived for structs")),
    };

    let mut metas = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for field in fields {
        let fa = field_attrs(field)?;
        if fa.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let property = ident.to_string().trim_start_matches("r#").to_string();
        let ty = &field.ty;

        let column = match &fa.column {
            Column::Missing => quote! { ::zdao_core::api::ColumnSpec::Missing },
            Column::Derived => quote! { ::zdao_core::api::ColumnSpec::Derived },
            Column::Named(c) => quote! { ::zdao_core::api::ColumnSpec::Named(#c) },
        };
        let pk = fa.pk.then(|| quote! { .primary_key() });
        let transient = fa.transient.then(|| quote! { .transient() });
        let version = fa.version.then(|| quote! { .version() });

        metas.push(quote! {
            ::zdao_core::api::FieldMeta::new(#property, <#ty as ::zdao_core::api::FromValue>::KIND)
                .column(#column)
                .nullable(<#ty as ::zdao_core::api::FromValue>::NULLABLE)
                #pk #transient #version
        });
        getters.push(quote! {
            #property => Some(::zdao_core::api::IntoValue::to_value(&self.#ident)),
        });
        setters.push(quote! {
            #property => {
                self.#ident = <#ty as ::zdao_core::api::FromValue>::from_value(value)?;
            }
        });
    }

    let table = opt_str(&attrs.table);
    let sequence = opt_str(&attrs.sequence);
    let index = opt_str(&attrs.index);
    let index_pattern = opt_str(&attrs.index_pattern);
    let doc_type = opt_str(&attrs.doc_type);
    let keyspace = opt_str(&attrs.keyspace);
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::zdao_core::api::Entity for #name #ty_generics #where_clause {
            fn descriptor() -> ::zdao_core::api::EntityDescriptor {
                ::zdao_core::api::EntityDescriptor {
                    type_name: #type_name,
                    table: #table,
                    sequence: #sequence,
                    index: #index,
                    index_pattern: #index_pattern,
                    doc_type: #doc_type,
                    keyspace: #keyspace,
                    fields: vec![#(#metas),*],
                }
            }

            fn get_value(&self, property: &str) -> Option<::zdao_core::api::Value> {
                match property {
                    #(#getters)*
                    _ => None,
                }
            }

            #[allow(unused_variables)]
            fn set_value(
                &mut self,
                property: &str,
                value: ::zdao_core::api::Value,
            ) -> ::zdao_core::error::DaoResult<()> {
                match property {
                    #(#setters)*
                    _ => {}
                }
                Ok(())
            }
        }
    })
}

fn opt_str(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(s) => quote! { Some(#s) },
        None => quote! { None },
    }
}

fn entity_attrs(input: &DeriveInput) -> syn::Result<EntityAttrs> {
    let mut attrs = EntityAttrs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("zdao")) {
        attr.parse_nested_meta(|meta| {
            let slot = if meta.path.is_ident("table") {
                &mut attrs.table
            } else if meta.path.is_ident("sequence") {
                &mut attrs.sequence
            } else if meta.path.is_ident("index") {
                &mut attrs.index
            } else if meta.path.is_ident("index_pattern") {
                &mut attrs.index_pattern
            } else if meta.path.is_ident("doc_type") {
                &mut attrs.doc_type
            } else if meta.path.is_ident("keyspace") {
                &mut attrs.keyspace
            } else {
                return Err(meta.error("unknown zdao entity attribute"));
            };
            let value: LitStr = meta.value()?.parse()?;
            *slot = Some(value.value());
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut fa = FieldAttrs {
        pk: false,
        column: Column::Missing,
        transient: false,
        version: false,
        skip: false,
    };
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("zdao")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("pk") {
                fa.pk = true;
            } else if meta.path.is_ident("column") {
                fa.column = if meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    Column::Named(value.value())
                } else {
                    Column::Derived
                };
            } else if meta.path.is_ident("transient") {
                fa.transient = true;
            } else if meta.path.is_ident("version") {
                fa.version = true;
            } else if meta.path.is_ident("skip") {
                fa.skip = true;
            } else {
                return Err(meta.error("unknown zdao field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(fa)
}
