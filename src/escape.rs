use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::BoxError;

/// Bytes left untouched by [`FormEscaper::escape`]: ASCII alphanumerics and `-_.~`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escaping strategy used for keys and values of raw query input.
pub trait QueryEscaper: Send + Sync {
    /// Escape `s` for inclusion in a query string.
    fn escape(&self, s: &str) -> String;

    /// Reverse [`escape`](Self::escape).
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is not a valid escaped component.
    fn unescape(&self, s: &str) -> Result<String, BoxError>;
}

/// Failure of the default escaper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EscapeError {
    /// A `%` was not followed by two hex digits.
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
    /// The unescaped bytes are not valid UTF-8.
    #[error("unescaped component is not valid UTF-8")]
    InvalidUtf8,
}

/// `application/x-www-form-urlencoded` component escaping: `+` stands for a space and every
/// `%` must introduce two hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormEscaper;

impl QueryEscaper for FormEscaper {
    fn escape(&self, s: &str) -> String {
        utf8_percent_encode(s, QUERY_COMPONENT)
            .to_string()
            .replace("%20", "+")
    }

    fn unescape(&self, s: &str) -> Result<String, BoxError> {
        check_escapes(s)?;
        let spaced = s.replace('+', " ");
        let decoded = percent_decode_str(&spaced)
            .decode_utf8()
            .map_err(|_| EscapeError::InvalidUtf8)?;
        Ok(decoded.into_owned())
    }
}

fn check_escapes(s: &str) -> Result<(), EscapeError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let ok = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !ok {
                let end = s.len().min(i + 3);
                let bad = s.get(i..end).unwrap_or(&s[i..]);
                return Err(EscapeError::InvalidEscape(bad.to_owned()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_decodes_plus_and_percent() {
        let e = FormEscaper;
        assert_eq!(e.unescape("a+b%5B0%5D").unwrap(), "a b[0]");
        assert_eq!(e.unescape("caf%C3%A9").unwrap(), "café");
        assert_eq!(e.unescape("").unwrap(), "");
    }

    #[test]
    fn unescape_rejects_bad_escapes() {
        let e = FormEscaper;
        let err = e.unescape("100%").unwrap_err();
        assert_eq!(
            err.downcast_ref::<EscapeError>(),
            Some(&EscapeError::InvalidEscape("%".into()))
        );
        assert!(e.unescape("%zz").is_err());
        assert!(e.unescape("%FF").is_err());
    }

    #[test]
    fn escape_is_reversible() {
        let e = FormEscaper;
        let raw = "a b&c=d[0]/é~";
        let escaped = e.escape(raw);
        assert_eq!(escaped, "a+b%26c%3Dd%5B0%5D%2F%C3%A9~");
        assert_eq!(e.unescape(&escaped).unwrap(), raw);
    }
}
