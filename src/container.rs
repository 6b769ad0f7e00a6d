use std::collections::{BTreeSet, HashMap};

use crate::error::DecodeError;
use crate::escape::QueryEscaper;
use crate::limits::DecodeLimits;
use crate::trace::trace;
use crate::utf8;

/// Build the key of the child `segment` under `prefix`: `prefix[segment]`, or the bare segment at
/// the root.
#[must_use]
pub fn child_key(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        return segment.to_owned();
    }
    let mut key = String::with_capacity(prefix.len() + segment.len() + 2);
    key.push_str(prefix);
    key.push('[');
    key.push_str(segment);
    key.push(']');
    key
}

/// The first segment of a key remainder: `[a][b]` yields `a`, `a[b]` yields `a`.
///
/// An unterminated bracket yields the whole remainder.
fn first_segment(rest: &str) -> &str {
    if let Some(inner) = rest.strip_prefix('[') {
        return match inner.find(']') {
            Some(end) => &inner[..end],
            None => rest,
        };
    }
    match rest.find('[') {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Strip `prefix` from `key` if `key` lies at or below it.
fn remainder<'k>(key: &'k str, prefix: &str) -> Option<&'k str> {
    let rest = key.strip_prefix(prefix)?;
    if prefix.is_empty() || rest.is_empty() || rest.starts_with('[') {
        Some(rest)
    } else {
        None
    }
}

fn auto_index_base(key: &str) -> Option<&str> {
    if key.len() > 2 {
        key.strip_suffix("[]")
    } else {
        None
    }
}

/// Flat key path to raw value mapping built from one input.
///
/// A container lives for a single decode call and is cleared afterwards.
#[derive(Debug, Default, Clone)]
pub struct Container {
    entries: HashMap<String, String>,
}

impl Container {
    /// Flatten raw escaped `k1=v1&k2=v2` input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParamKey` / `InvalidParamValue` if a key or value is not valid UTF-8 or
    /// fails to unescape.
    pub fn from_bytes(
        data: &[u8],
        escaper: &dyn QueryEscaper,
        limits: &DecodeLimits,
    ) -> Result<Self, DecodeError> {
        let mut out = Self::default();
        out.fill_from_bytes(data, escaper, limits)?;
        Ok(out)
    }

    /// Flatten an already-unescaped key to value-list mapping.
    pub fn from_values<I, K, V, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        out.fill_from_values(values);
        out
    }

    pub(crate) fn fill_from_bytes(
        &mut self,
        data: &[u8],
        escaper: &dyn QueryEscaper,
        limits: &DecodeLimits,
    ) -> Result<(), DecodeError> {
        for pair in data.split(|b| *b == b'&') {
            let Some(eq) = pair.iter().position(|b| *b == b'=') else {
                continue;
            };
            let (raw_key, raw_value) = (&pair[..eq], &pair[eq + 1..]);

            let key = utf8::validate(raw_key)
                .and_then(|k| escaper.unescape(k))
                .map_err(|source| DecodeError::InvalidParamKey {
                    path: String::from_utf8_lossy(raw_key).into_owned(),
                    source,
                })?;
            let value = utf8::validate(raw_value)
                .and_then(|v| escaper.unescape(v))
                .map_err(|source| DecodeError::InvalidParamValue {
                    path: key.clone(),
                    value: String::from_utf8_lossy(raw_value).into_owned(),
                    source,
                })?;

            let key = match auto_index_base(&key) {
                Some(base) => self.next_free_index(base, limits).unwrap_or(key),
                None => key,
            };
            self.entries.insert(key, value);
        }
        Ok(())
    }

    pub(crate) fn fill_from_values<I, K, V, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (key, list) in values {
            let key = key.as_ref();
            if let Some(base) = auto_index_base(key) {
                for (i, value) in list.into_iter().enumerate() {
                    self.entries
                        .insert(child_key(base, &i.to_string()), value.into());
                }
            } else if let Some(first) = list.into_iter().next() {
                self.entries.insert(key.to_owned(), first.into());
            }
        }
    }

    /// Smallest `base[i]` not already present, scanning at most `max_auto_index` candidates.
    fn next_free_index(&self, base: &str, limits: &DecodeLimits) -> Option<String> {
        let found = (0..limits.max_auto_index)
            .map(|i| child_key(base, &i.to_string()))
            .find(|candidate| !self.entries.contains_key(candidate));
        if let Some(key) = &found {
            trace!(key = %key, "auto-indexed key");
        }
        found
    }

    /// Look up the raw value stored at exactly `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Distinct immediate child tokens under `prefix`.
    ///
    /// A key equal to `prefix` contributes the empty token.
    #[must_use]
    pub fn lookup(&self, prefix: &str) -> BTreeSet<&str> {
        self.entries
            .keys()
            .filter_map(|key| remainder(key, prefix))
            .map(first_segment)
            .collect()
    }

    /// Returns true if any key lies at or below `prefix`.
    #[must_use]
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries
            .keys()
            .any(|key| remainder(key, prefix).is_some())
    }

    /// Number of flattened entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries were flattened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries and release their storage.
    pub fn release(&mut self) {
        self.entries = HashMap::new();
    }
}
