use core::any::Any;
use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::chain::{DecoderChain, KindDecodeFn, ValueDecoder};
use crate::codec::{DynValue, QueryDecode};
use crate::container::Container;
use crate::decode::Decoder;
use crate::error::DecodeError;
use crate::escape::{FormEscaper, QueryEscaper};
use crate::limits::DecodeLimits;
use crate::shape::Kind;
use crate::trace::trace;

/// Construction-time configuration of a [`Parser`].
#[derive(Clone)]
pub struct ParserOptions {
    escaper: Arc<dyn QueryEscaper>,
    limits: DecodeLimits,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            escaper: Arc::new(FormEscaper),
            limits: DecodeLimits::default(),
        }
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl ParserOptions {
    /// Use `escaper` to unescape raw keys and values.
    #[must_use]
    pub fn with_escaper(mut self, escaper: Arc<dyn QueryEscaper>) -> Self {
        self.escaper = escaper;
        self
    }

    /// Use `limits` while flattening and decoding.
    #[must_use]
    pub const fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The configured limits.
    #[must_use]
    pub const fn limits(&self) -> &DecodeLimits {
        &self.limits
    }
}

/// Reusable query decoder.
///
/// Registered decoders and overrides are shared by every call. Calls on one parser from several
/// threads are serialized; each call starts from an empty container and releases it on return.
#[derive(Debug, Default)]
pub struct Parser {
    chain: DecoderChain,
    options: ParserOptions,
    state: Mutex<Container>,
}

impl Parser {
    /// A parser with the default escaper and limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser with the given options.
    #[must_use]
    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Register a custom decoder. Earlier registrations take precedence.
    pub fn register_value_decoder<D: ValueDecoder + 'static>(&mut self, decoder: D) {
        self.chain.register_value_decoder(Arc::new(decoder));
    }

    /// Override the primitive decoder for `kind`. `None` disables the kind so destinations of
    /// that kind fail with `UnhandledType`.
    pub fn register_decode_fn(&mut self, kind: Kind, decode: Option<KindDecodeFn>) {
        self.chain.register_decode_fn(kind, decode);
    }

    /// Decode raw escaped `k=v&k=v` input into `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnmarshal` before reading any input if `target` is an empty [`DynValue`],
    /// otherwise the first failure met while flattening or decoding.
    pub fn unmarshal<T: QueryDecode>(&self, data: &[u8], target: &mut T) -> Result<(), DecodeError> {
        check_destination(target)?;
        let mut container = self.lock();
        trace!(input_len = data.len(), "unmarshal");
        let result = container
            .fill_from_bytes(data, self.options.escaper.as_ref(), &self.options.limits)
            .and_then(|()| self.run(&container, target));
        container.release();
        result
    }

    /// Decode an already-unescaped key to value-list mapping into `target`.
    ///
    /// A `name[]` key spreads its values over `name[0]`, `name[1]`, ...; any other key uses its
    /// first value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnmarshal` if `target` is an empty [`DynValue`], otherwise the first
    /// failure met while decoding.
    pub fn unmarshal_values<T, I, K, V, S>(&self, values: I, target: &mut T) -> Result<(), DecodeError>
    where
        T: QueryDecode,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        check_destination(target)?;
        let mut container = self.lock();
        container.fill_from_values(values);
        trace!(entries = container.len(), "unmarshal values");
        let result = self.run(&container, target);
        container.release();
        result
    }

    /// Decode raw input into the value held by `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnmarshal` before reading any input if `target` is empty, otherwise as
    /// [`unmarshal`](Self::unmarshal).
    pub fn unmarshal_dyn(&self, data: &[u8], target: &mut DynValue) -> Result<(), DecodeError> {
        self.unmarshal(data, target)
    }

    fn lock(&self) -> MutexGuard<'_, Container> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.release();
        guard
    }

    fn run<T: QueryDecode>(&self, container: &Container, target: &mut T) -> Result<(), DecodeError> {
        trace!(
            entries = container.len(),
            ty = core::any::type_name::<T>(),
            "decoding"
        );
        Decoder::new(container, &self.chain, &self.options.limits)
            .decode(target, "")
            .map(|_| ())
    }
}

/// An empty [`DynValue`] at the root has nothing to decode into.
fn check_destination<T: QueryDecode>(target: &T) -> Result<(), DecodeError> {
    let any: &dyn Any = target;
    match any.downcast_ref::<DynValue>() {
        Some(dyn_value) if dyn_value.is_empty() => Err(DecodeError::InvalidUnmarshal),
        _ => Ok(()),
    }
}
