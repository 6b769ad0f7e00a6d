use crate::chain::DecoderChain;
use crate::codec::QueryDecode;
use crate::container::{child_key, Container};
use crate::error::DecodeError;
use crate::limits::DecodeLimits;
use crate::trace::debug;

/// A slice index would grow the destination past [`DecodeLimits::max_slice_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slice index {index} exceeds the maximum slice length {max_len}")]
pub struct SliceLimitError {
    /// Requested index.
    pub index: usize,
    /// Configured maximum length.
    pub max_len: usize,
}

/// Decoding descended past [`DecodeLimits::max_depth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("nesting depth exceeds the maximum depth {max_depth}")]
pub struct DepthLimitError {
    /// Configured maximum depth.
    pub max_depth: usize,
}

/// Type-directed traversal over one flattened input.
///
/// A `Decoder` borrows the container and the parser configuration for the duration of a single
/// call. [`QueryDecode`] implementations receive it and recurse through [`Decoder::decode`].
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    container: &'a Container,
    chain: &'a DecoderChain,
    limits: &'a DecodeLimits,
    depth: usize,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over `container`.
    #[must_use]
    pub const fn new(
        container: &'a Container,
        chain: &'a DecoderChain,
        limits: &'a DecodeLimits,
    ) -> Self {
        Self {
            container,
            chain,
            limits,
            depth: 0,
        }
    }

    /// Decode `target` from the keys at and below `prefix`.
    ///
    /// Types claimed by a strategy of the resolution chain are decoded from the single value at
    /// `prefix`; everything else expands structurally, one level deeper.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParamKey` naming `prefix` when the expansion would exceed
    /// [`DecodeLimits::max_depth`], otherwise the first failure met below `prefix`.
    pub fn decode<T: QueryDecode>(&self, target: &mut T, prefix: &str) -> Result<bool, DecodeError> {
        if self.chain.claims(&T::shape()) {
            return self.decode_scalar(target, prefix);
        }
        target.decode_structure(&self.nested(prefix)?, prefix)
    }

    /// Current nesting depth; zero at the root.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    fn nested(&self, prefix: &str) -> Result<Self, DecodeError> {
        let depth = self.depth + 1;
        if depth > self.limits.max_depth {
            debug!(path = prefix, depth, "nesting depth limit exceeded");
            return Err(DecodeError::InvalidParamKey {
                path: prefix.to_owned(),
                source: Box::new(DepthLimitError {
                    max_depth: self.limits.max_depth,
                }),
            });
        }
        Ok(Self { depth, ..*self })
    }

    /// Decode the value stored at exactly `prefix` into `target`, leaving it untouched if the
    /// key is absent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParamValue` if the value fails to decode or convert.
    pub fn decode_scalar<T: QueryDecode>(
        &self,
        target: &mut T,
        prefix: &str,
    ) -> Result<bool, DecodeError> {
        let Some(raw) = self.container.get(prefix) else {
            return Ok(false);
        };
        *target = self.decode_text::<T>(prefix, raw)?;
        Ok(true)
    }

    /// Decode a struct field stored under `key`.
    ///
    /// A required field fails with `MissingRequiredParam` when no key lies under `key`, or when
    /// decoding it used none.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredParam` or the field's own failure.
    pub fn decode_field<T: QueryDecode>(
        &self,
        target: &mut T,
        key: &str,
        required: bool,
    ) -> Result<bool, DecodeError> {
        if required && !self.contains(key) {
            debug!(path = key, "required param absent");
            return Err(DecodeError::MissingRequiredParam {
                path: key.to_owned(),
            });
        }
        let found = self.decode(target, key)?;
        if required && !found {
            debug!(path = key, "required param resolved no value");
            return Err(DecodeError::MissingRequiredParam {
                path: key.to_owned(),
            });
        }
        Ok(found)
    }

    /// Returns true if any key lies at or below `prefix`.
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.container.contains_prefix(prefix)
    }

    /// The zero value of `T`.
    ///
    /// # Errors
    ///
    /// Returns `UnhandledType` if `T` has no zero value.
    pub fn zero<T: QueryDecode>(&self) -> Result<T, DecodeError> {
        T::zero_value().ok_or_else(DecodeError::unhandled::<T>)
    }

    /// Sorted distinct slice indices directly under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParamKey` naming `prefix[token]` for a token that is not a decimal index
    /// or that exceeds the slice length limit.
    pub fn lookup_indices(&self, prefix: &str) -> Result<Vec<usize>, DecodeError> {
        let tokens = self.container.lookup(prefix);
        let mut indices = Vec::with_capacity(tokens.len());
        for token in tokens {
            let index = token
                .parse::<usize>()
                .map_err(|e| DecodeError::InvalidParamKey {
                    path: child_key(prefix, token),
                    source: Box::new(e),
                })?;
            if index >= self.limits.max_slice_len {
                return Err(DecodeError::InvalidParamKey {
                    path: child_key(prefix, token),
                    source: Box::new(SliceLimitError {
                        index,
                        max_len: self.limits.max_slice_len,
                    }),
                });
            }
            indices.push(index);
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }

    /// Decode the key/value pairs directly under `prefix`.
    ///
    /// Returns `None` when no pair had a value, so the destination map can be left untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMapKeyType` / `InvalidMapValueType` if `K` or `V` is not primitive,
    /// `InvalidParamKey` for an undecodable key and `InvalidParamValue` for an undecodable value.
    pub fn decode_entries<K, V>(&self, prefix: &str) -> Result<Option<Vec<(K, V)>>, DecodeError>
    where
        K: QueryDecode,
        V: QueryDecode,
    {
        if !K::KIND.is_primitive() {
            return Err(DecodeError::InvalidMapKeyType {
                path: prefix.to_owned(),
                type_name: core::any::type_name::<K>(),
            });
        }
        if !V::KIND.is_primitive() {
            return Err(DecodeError::InvalidMapValueType {
                path: prefix.to_owned(),
                type_name: core::any::type_name::<V>(),
            });
        }

        let tokens = self.container.lookup(prefix);
        let mut entries = Vec::with_capacity(tokens.len());
        for token in tokens {
            let path = child_key(prefix, token);
            let key = self
                .chain
                .decode_text::<K>(token)
                .map_err(|source| DecodeError::InvalidParamKey {
                    path: path.clone(),
                    source,
                })?;
            let Some(raw) = self.container.get(&path) else {
                continue;
            };
            let value = self.decode_text::<V>(&path, raw)?;
            entries.push((key, value));
        }
        Ok((!entries.is_empty()).then_some(entries))
    }

    fn decode_text<T: QueryDecode>(&self, path: &str, raw: &str) -> Result<T, DecodeError> {
        self.chain.decode_text::<T>(raw).map_err(|source| {
            debug!(path, value = raw, error = %source, "param value rejected");
            DecodeError::InvalidParamValue {
                path: path.to_owned(),
                value: raw.to_owned(),
                source,
            }
        })
    }
}
