//! Derive macro for `urlquery::QueryDecode`.
//!
//! Named-field structs decode each field under `prefix[name]`. Field attributes accept either a
//! tag string, `#[query = "name,required"]` / `#[query = "-"]`, or a list,
//! `#[query(rename = "name", required, skip, flatten)]`. Single-field tuple structs derive as
//! newtypes over their field. `#[query(param)]` on the type routes decoding through its
//! `QueryParam` implementation.

extern crate proc_macro;

mod attrs;
mod decode;
mod types;
mod util;

use proc_macro::TokenStream;
use syn::{parse_macro_input, Data, DeriveInput};

#[proc_macro_derive(QueryDecode, attributes(query))]
pub fn derive_query_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let out = match &input.data {
        Data::Struct(data) => {
            decode::decode_struct(&input, data).unwrap_or_else(syn::Error::into_compile_error)
        }
        Data::Enum(e) => {
            syn::Error::new(e.enum_token.span, "QueryDecode not supported for enums")
                .to_compile_error()
        }
        Data::Union(u) => {
            syn::Error::new(u.union_token.span, "QueryDecode not supported for unions")
                .to_compile_error()
        }
    };
    TokenStream::from(out)
}
