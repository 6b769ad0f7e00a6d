use crate::error::BoxError;

#[cfg(feature = "simdutf8")]
use simdutf8::compat as simd_utf8;

/// Validates UTF-8 bytes and returns a borrowed `&str` on success.
#[inline]
pub fn validate(bytes: &[u8]) -> Result<&str, BoxError> {
    #[cfg(feature = "simdutf8")]
    {
        simd_utf8::from_utf8(bytes).map_err(|e| Box::new(e) as BoxError)
    }

    #[cfg(not(feature = "simdutf8"))]
    {
        core::str::from_utf8(bytes).map_err(|e| Box::new(e) as BoxError)
    }
}
