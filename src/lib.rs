//! # urlquery
//!
//! Decode bracket-notation URL query strings into nested Rust values.
//!
//! Keys address nested destinations with bracket segments: `user[name]=ann` fills the `name`
//! field of the `user` field, `tags[2]=x` the third element of a `Vec` or array, and
//! `scores[math]=90` an entry of a map. A key ending in `[]` is assigned the next free index.
//!
//! ```
//! use urlquery::QueryDecode;
//!
//! #[derive(Debug, Default, Clone, QueryDecode)]
//! struct Child {
//!     #[query = "desc,required"]
//!     description: String,
//!     age: u8,
//! }
//!
//! #[derive(Debug, Default, QueryDecode)]
//! struct Search {
//!     #[query(rename = "q")]
//!     query: String,
//!     tags: Vec<String>,
//!     children: Vec<Child>,
//! }
//!
//! let search: Search =
//!     urlquery::from_str("q=rust&tags[]=a&tags[]=b&children[0][desc]=x&children[0][age]=3")?;
//! assert_eq!(search.query, "rust");
//! assert_eq!(search.tags, ["a", "b"]);
//! assert_eq!(search.children[0].age, 3);
//! # Ok::<(), urlquery::DecodeError>(())
//! ```
//!
//! ## Decoding model
//!
//! - **Structs** (derived) decode each field under `prefix[name]`. Fields can be renamed,
//!   marked `required`, skipped, or flattened into the parent's prefix.
//! - **`Option<T>`** is only allocated when at least one key lies under its prefix.
//! - **`Vec<T>`** is rebuilt with length `max(index) + 1`; earlier contents are kept at indices the
//!   input does not mention.
//! - **`[T; N]`** decodes every index independently; missing indices keep their value.
//! - **Maps** take primitive keys and values and are only replaced when a pair decodes.
//! - **Scalars** resolve through the decoder chain: registered [`ValueDecoder`]s, the builtin
//!   RFC 3339 [`TimestampDecoder`], the [`QueryParam`] protocol, then the primitive table keyed
//!   by [`Kind`].
//!
//! Each call reports at most one [`DecodeError`], carrying the full key path of the failing
//! parameter.
//!
//! ## Feature flags
//!
//! - `tracing` *(default)*: emits `tracing` events while decoding.
//! - `simdutf8`: enables SIMD-accelerated UTF-8 validation of raw input.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod chain;
mod codec;
mod container;
mod decode;
mod error;
mod escape;
mod limits;
mod parser;
mod shape;
mod trace;
pub(crate) mod utf8;

pub use crate::chain::{DecoderChain, KindDecodeFn, TimestampDecoder, ValueDecoder};
pub use crate::codec::{decode_param, DynQueryDecode, DynValue, QueryDecode, QueryParam};
pub use crate::container::{child_key, Container};
pub use crate::decode::{Decoder, DepthLimitError, SliceLimitError};
pub use crate::error::{
    is_invalid_destination_error, is_invalid_param_error, is_missing_param_error, param_name,
    BoxError, DecodeError,
};
pub use crate::escape::{EscapeError, FormEscaper, QueryEscaper};
pub use crate::limits::{
    DecodeLimits, DEFAULT_MAX_AUTO_INDEX, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SLICE_LEN,
};
pub use crate::parser::{Parser, ParserOptions};
pub use crate::shape::{Kind, Shape};

pub use urlquery_derive::QueryDecode;

/// Decode raw escaped query bytes into `target` with a default [`Parser`].
///
/// # Errors
///
/// Returns the first failure met while flattening or decoding.
pub fn unmarshal<T: QueryDecode>(data: &[u8], target: &mut T) -> Result<(), DecodeError> {
    Parser::new().unmarshal(data, target)
}

/// Decode an unescaped key to value-list mapping into `target` with a default [`Parser`].
///
/// # Errors
///
/// Returns the first failure met while decoding.
pub fn unmarshal_values<T, I, K, V, S>(values: I, target: &mut T) -> Result<(), DecodeError>
where
    T: QueryDecode,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    Parser::new().unmarshal_values(values, target)
}

/// Decode a fresh `T` from raw escaped query bytes.
///
/// # Errors
///
/// Returns the first failure met while flattening or decoding.
pub fn from_bytes<T: QueryDecode + Default>(data: &[u8]) -> Result<T, DecodeError> {
    let mut out = T::default();
    unmarshal(data, &mut out)?;
    Ok(out)
}

/// Decode a fresh `T` from a raw escaped query string.
///
/// # Errors
///
/// Returns the first failure met while flattening or decoding.
pub fn from_str<T: QueryDecode + Default>(query: &str) -> Result<T, DecodeError> {
    from_bytes(query.as_bytes())
}
