use std::error::Error as StdError;

/// Boxed cause carried by decode errors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A structured decode failure.
///
/// Every variant that can be attributed to a single parameter carries the fully-qualified key path
/// (for example `children[3][desc]`) so callers can report the offending field. Underlying causes
/// are reachable through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// A key segment was malformed (unescape failure, non-integer slice index, bad map key).
    #[error("failed to parse param key {path:?}: {source}")]
    InvalidParamKey {
        /// Fully-qualified key path.
        path: String,
        /// Underlying cause.
        source: BoxError,
    },

    /// A value failed its terminal decode or conversion.
    #[error("failed to parse param value {value:?} for key {path:?}: {source}")]
    InvalidParamValue {
        /// Fully-qualified key path.
        path: String,
        /// Raw (unescaped) value.
        value: String,
        /// Underlying cause.
        source: BoxError,
    },

    /// A required field or subtree had no resolvable data.
    #[error("missing required param {path:?}")]
    MissingRequiredParam {
        /// Fully-qualified key path of the required field.
        path: String,
    },

    /// A map key type lies outside the primitive-decodable set.
    #[error("failed to handle map key type({type_name}) for param {path:?}")]
    InvalidMapKeyType {
        /// Key path of the map.
        path: String,
        /// Rust type name of the map key.
        type_name: &'static str,
    },

    /// A map value type lies outside the primitive-decodable set.
    #[error("failed to handle map value type({type_name}) for param {path:?}")]
    InvalidMapValueType {
        /// Key path of the map.
        path: String,
        /// Rust type name of the map value.
        type_name: &'static str,
    },

    /// No strategy in the resolution chain handles the destination type.
    #[error("failed to handle type({type_name})")]
    UnhandledType {
        /// Rust type name of the destination.
        type_name: &'static str,
    },

    /// The primitive table was asked for an integer or float width it does not know.
    #[error("failed to handle unsupported bit size({bits})")]
    UnsupportedBitSize {
        /// Requested width.
        bits: u32,
    },

    /// The destination was not a usable reference.
    #[error("failed to unmarshal(empty destination)")]
    InvalidUnmarshal,

    /// A primitive literal failed to parse; wraps the parser's own diagnostic.
    #[error("failed to translate: {0}")]
    Translated(#[source] BoxError),
}

impl DecodeError {
    pub(crate) fn unhandled<T: ?Sized>() -> Self {
        Self::UnhandledType {
            type_name: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn translated<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Translated(Box::new(err))
    }

    /// Fully-qualified key path this error refers to, or `""` when it has none.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidParamKey { path, .. }
            | Self::InvalidParamValue { path, .. }
            | Self::MissingRequiredParam { path }
            | Self::InvalidMapKeyType { path, .. }
            | Self::InvalidMapValueType { path, .. } => path,
            _ => "",
        }
    }

    /// Returns true if a required parameter was absent.
    #[must_use]
    pub fn is_missing_param(&self) -> bool {
        self.any_in_chain(|e| matches!(e, Self::MissingRequiredParam { .. }))
    }

    /// Returns true if a parameter key or value was malformed.
    #[must_use]
    pub fn is_invalid_param(&self) -> bool {
        self.any_in_chain(|e| {
            matches!(
                e,
                Self::InvalidParamKey { .. } | Self::InvalidParamValue { .. }
            )
        })
    }

    /// Returns true if the destination type itself cannot be decoded into.
    #[must_use]
    pub fn is_invalid_destination(&self) -> bool {
        self.any_in_chain(|e| {
            matches!(
                e,
                Self::InvalidMapKeyType { .. }
                    | Self::InvalidMapValueType { .. }
                    | Self::UnhandledType { .. }
            )
        })
    }

    /// Find the first error of type `E` in this error or its chain of causes.
    #[must_use]
    pub fn find<E: StdError + 'static>(&self) -> Option<&E> {
        let mut cur: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = cur {
            if let Some(hit) = err.downcast_ref::<E>() {
                return Some(hit);
            }
            cur = err.source();
        }
        None
    }

    fn any_in_chain(&self, pred: impl Fn(&Self) -> bool) -> bool {
        let mut cur: Option<&(dyn StdError + 'static)> = Some(self);
        while let Some(err) = cur {
            if err.downcast_ref::<Self>().is_some_and(&pred) {
                return true;
            }
            cur = err.source();
        }
        false
    }
}

/// Returns true if `err` reports a missing required parameter.
#[must_use]
pub fn is_missing_param_error(err: &DecodeError) -> bool {
    err.is_missing_param()
}

/// Returns true if `err` reports a malformed parameter key or value.
#[must_use]
pub fn is_invalid_param_error(err: &DecodeError) -> bool {
    err.is_invalid_param()
}

/// Returns true if `err` reports an unsupported destination type.
#[must_use]
pub fn is_invalid_destination_error(err: &DecodeError) -> bool {
    err.is_invalid_destination()
}

/// Extract the fully-qualified parameter path from `err`, or `""`.
#[must_use]
pub fn param_name(err: &DecodeError) -> &str {
    err.path()
}
