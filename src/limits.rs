/// Default maximum nesting depth of a decode.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default ceiling on the `key[]` auto-index scan.
pub const DEFAULT_MAX_AUTO_INDEX: usize = 1_000_000;

/// Default maximum slice length a single index may request.
///
/// This is a safety limit; adjust explicitly for your deployment.
pub const DEFAULT_MAX_SLICE_LEN: usize = 1 << 20;

/// Resource limits applied while flattening and decoding.
///
/// Limits are enforced deterministically and bound the work adversarial input can cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of candidate indices tried when rewriting a `key[]` to `key[i]`.
    ///
    /// When exhausted the key is stored unchanged.
    pub max_auto_index: usize,
    /// Maximum length (`max index + 1`) a decoded slice may grow to.
    pub max_slice_len: usize,
    /// Maximum nesting depth of structural decoding.
    ///
    /// Every value decoded below another counts one level, so a field of an `Option<Box<T>>`
    /// costs three levels per bracket segment.
    pub max_depth: usize,
}

impl DecodeLimits {
    /// Construct limits with the given slice length ceiling and the default auto-index and depth
    /// ceilings.
    #[must_use]
    pub const fn for_slice_len(max_slice_len: usize) -> Self {
        Self {
            max_auto_index: DEFAULT_MAX_AUTO_INDEX,
            max_slice_len,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::for_slice_len(DEFAULT_MAX_SLICE_LEN)
    }
}
