use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, DataStruct, DeriveInput, Fields, FieldsNamed, LitStr, Type};

use crate::attrs::{ensure_no_query_attrs, parse_query_container_attrs, parse_query_field_attrs};
use crate::types::mentions_self;
use crate::util::{add_where_bound, where_clause_of};

pub(crate) fn decode_struct(input: &DeriveInput, data: &DataStruct) -> syn::Result<TokenStream> {
    let container = parse_query_container_attrs(&input.attrs)?;
    if container.param {
        for field in &data.fields {
            ensure_no_query_attrs(&field.attrs, "fields of `query(param)` types")?;
        }
        return Ok(param_impl(input));
    }

    match &data.fields {
        Fields::Named(fields) => named_impl(input, fields),
        Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
            let field = &fields.unnamed[0];
            ensure_no_query_attrs(&field.attrs, "newtype fields")?;
            Ok(newtype_impl(input, &field.ty))
        }
        Fields::Unnamed(fields) => Err(syn::Error::new(
            fields.span(),
            "QueryDecode supports tuple structs with exactly one field",
        )),
        Fields::Unit => Err(syn::Error::new(
            input.ident.span(),
            "QueryDecode is not supported for unit structs",
        )),
    }
}

/// Types that decode themselves through `QueryParam`.
fn param_impl(input: &DeriveInput) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let mut wc = where_clause_of(&input.generics);
    let self_ty: Type = syn::parse_quote!(#name #ty_generics);
    add_where_bound(
        &mut wc,
        &self_ty,
        quote!(::core::default::Default + ::urlquery::QueryParam + 'static),
    );

    quote! {
        impl #impl_generics ::urlquery::QueryDecode for #name #ty_generics #wc {
            const KIND: ::urlquery::Kind = ::urlquery::Kind::Opaque;

            fn zero_value() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(::core::default::Default::default())
            }

            fn query_param_decoder() -> ::core::option::Option<
                fn(&str) -> ::core::result::Result<Self, ::urlquery::BoxError>,
            > {
                ::core::option::Option::Some(::urlquery::decode_param::<Self>)
            }
        }
    }
}

fn named_impl(input: &DeriveInput, fields: &FieldsNamed) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let mut wc = where_clause_of(&input.generics);

    let mut zeros = Vec::new();
    let mut steps = Vec::new();

    for field in &fields.named {
        let attr = parse_query_field_attrs(&field.attrs)?;
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        if attr.skip {
            add_where_bound(&mut wc, ty, quote!(::core::default::Default));
            zeros.push(quote! { #ident: ::core::default::Default::default(), });
            continue;
        }
        if !mentions_self(ty, name) {
            add_where_bound(&mut wc, ty, quote!(::urlquery::QueryDecode));
        }
        zeros.push(quote! { #ident: <#ty as ::urlquery::QueryDecode>::zero_value()?, });

        if attr.flatten {
            steps.push(quote! {
                found |= de.decode(&mut self.#ident, prefix)?;
            });
            continue;
        }

        let key = attr.rename.unwrap_or_else(|| {
            let raw = ident.to_string();
            LitStr::new(raw.strip_prefix("r#").unwrap_or(&raw), ident.span())
        });
        let required = attr.required;
        steps.push(quote! {
            found |= de.decode_field(
                &mut self.#ident,
                &::urlquery::child_key(prefix, #key),
                #required,
            )?;
        });
    }

    Ok(quote! {
        impl #impl_generics ::urlquery::QueryDecode for #name #ty_generics #wc {
            const KIND: ::urlquery::Kind = ::urlquery::Kind::Struct;

            fn zero_value() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(Self { #(#zeros)* })
            }

            #[allow(unused_mut)]
            fn decode_structure(
                &mut self,
                de: &::urlquery::Decoder<'_>,
                prefix: &str,
            ) -> ::core::result::Result<bool, ::urlquery::DecodeError> {
                let mut found = false;
                #(#steps)*
                ::core::result::Result::Ok(found)
            }
        }
    })
}

/// Single-field tuple structs take the inner type's kind and accept whatever it converts from.
fn newtype_impl(input: &DeriveInput, inner: &Type) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, _) = input.generics.split_for_impl();
    let mut wc = where_clause_of(&input.generics);
    if !mentions_self(inner, name) {
        add_where_bound(&mut wc, inner, quote!(::urlquery::QueryDecode));
    }

    quote! {
        impl #impl_generics ::urlquery::QueryDecode for #name #ty_generics #wc {
            const KIND: ::urlquery::Kind = <#inner as ::urlquery::QueryDecode>::KIND;

            fn zero_value() -> ::core::option::Option<Self> {
                <#inner as ::urlquery::QueryDecode>::zero_value().map(Self)
            }

            fn converts_from(id: ::core::any::TypeId) -> bool {
                id == ::core::any::TypeId::of::<Self>()
                    || <#inner as ::urlquery::QueryDecode>::converts_from(id)
            }

            fn convert(
                value: ::std::boxed::Box<dyn ::core::any::Any>,
            ) -> ::core::result::Result<Self, ::std::boxed::Box<dyn ::core::any::Any>> {
                match value.downcast::<Self>() {
                    ::core::result::Result::Ok(v) => ::core::result::Result::Ok(*v),
                    ::core::result::Result::Err(value) => {
                        <#inner as ::urlquery::QueryDecode>::convert(value).map(Self)
                    }
                }
            }

            fn decode_structure(
                &mut self,
                de: &::urlquery::Decoder<'_>,
                prefix: &str,
            ) -> ::core::result::Result<bool, ::urlquery::DecodeError> {
                de.decode(&mut self.0, prefix)
            }
        }
    }
}
