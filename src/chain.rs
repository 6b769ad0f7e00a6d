use core::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::codec::QueryDecode;
use crate::error::{BoxError, DecodeError};
use crate::shape::{Kind, Shape};
use crate::trace::trace;

/// A strategy that decodes one string into a value of the types it claims.
///
/// Registered decoders are consulted in registration order and the first one that claims a
/// destination type wins. The returned value must be the destination type or a type it
/// [converts from](Shape::converts_from).
pub trait ValueDecoder: Send + Sync {
    /// Returns true if this decoder handles the described type.
    fn decodes_type(&self, shape: &Shape) -> bool;

    /// Decode `value`.
    ///
    /// # Errors
    ///
    /// Returns the decoder's own error if `value` is malformed.
    fn decode(&self, value: &str) -> Result<Box<dyn Any>, BoxError>;
}

/// Builtin decoder for RFC 3339 timestamps into any type convertible from [`OffsetDateTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampDecoder;

impl ValueDecoder for TimestampDecoder {
    fn decodes_type(&self, shape: &Shape) -> bool {
        shape.converts_from::<OffsetDateTime>()
    }

    fn decode(&self, value: &str) -> Result<Box<dyn Any>, BoxError> {
        let ts = OffsetDateTime::parse(value, &Rfc3339)?;
        Ok(Box::new(ts))
    }
}

/// Per-kind override of the primitive table.
pub type KindDecodeFn = Arc<dyn Fn(&str) -> Result<Box<dyn Any>, BoxError> + Send + Sync>;

type PrimitiveFn = fn(&str) -> Result<Box<dyn Any>, BoxError>;

fn parse_bool(value: &str) -> Result<bool, DecodeError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(DecodeError::translated(InvalidBool(value.to_owned()))),
    }
}

/// Rejected boolean literal.
#[derive(Debug, thiserror::Error)]
#[error("invalid boolean literal {0:?}")]
struct InvalidBool(String);

fn int_value(value: &str, bits: u32) -> Result<Box<dyn Any>, BoxError> {
    fn parse<T>(value: &str) -> Result<Box<dyn Any>, BoxError>
    where
        T: core::str::FromStr + 'static,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        value
            .parse::<T>()
            .map(|v| Box::new(v) as Box<dyn Any>)
            .map_err(|e| DecodeError::translated(e).into())
    }
    match bits {
        0 => parse::<isize>(value),
        8 => parse::<i8>(value),
        16 => parse::<i16>(value),
        32 => parse::<i32>(value),
        64 => parse::<i64>(value),
        _ => Err(DecodeError::UnsupportedBitSize { bits }.into()),
    }
}

fn uint_value(value: &str, bits: u32) -> Result<Box<dyn Any>, BoxError> {
    fn parse<T>(value: &str) -> Result<Box<dyn Any>, BoxError>
    where
        T: core::str::FromStr + 'static,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        value
            .parse::<T>()
            .map(|v| Box::new(v) as Box<dyn Any>)
            .map_err(|e| DecodeError::translated(e).into())
    }
    match bits {
        0 => parse::<usize>(value),
        8 => parse::<u8>(value),
        16 => parse::<u16>(value),
        32 => parse::<u32>(value),
        64 => parse::<u64>(value),
        _ => Err(DecodeError::UnsupportedBitSize { bits }.into()),
    }
}

fn float_value(value: &str, bits: u32) -> Result<Box<dyn Any>, BoxError> {
    match bits {
        32 => value
            .parse::<f32>()
            .map(|v| Box::new(v) as Box<dyn Any>)
            .map_err(|e| DecodeError::translated(e).into()),
        64 => value
            .parse::<f64>()
            .map(|v| Box::new(v) as Box<dyn Any>)
            .map_err(|e| DecodeError::translated(e).into()),
        _ => Err(DecodeError::UnsupportedBitSize { bits }.into()),
    }
}

/// The default decoder for a primitive kind, if any.
fn primitive_decoder(kind: Kind) -> Option<PrimitiveFn> {
    let f: PrimitiveFn = match kind {
        Kind::Bool => |v| Ok(Box::new(parse_bool(v)?) as Box<dyn Any>),
        Kind::Isize => |v| int_value(v, 0),
        Kind::I8 => |v| int_value(v, 8),
        Kind::I16 => |v| int_value(v, 16),
        Kind::I32 => |v| int_value(v, 32),
        Kind::I64 => |v| int_value(v, 64),
        Kind::Usize => |v| uint_value(v, 0),
        Kind::U8 => |v| uint_value(v, 8),
        Kind::U16 => |v| uint_value(v, 16),
        Kind::U32 => |v| uint_value(v, 32),
        Kind::U64 => |v| uint_value(v, 64),
        Kind::F32 => |v| float_value(v, 32),
        Kind::F64 => |v| float_value(v, 64),
        Kind::String => |v| Ok(Box::new(v.to_owned()) as Box<dyn Any>),
        _ => return None,
    };
    Some(f)
}

/// Ordered strategies turning one string into one typed value.
///
/// Precedence: registered decoders, builtin decoders, the self-describing protocol, then the
/// primitive table keyed by [`Kind`].
#[derive(Clone)]
pub struct DecoderChain {
    custom: Vec<Arc<dyn ValueDecoder>>,
    builtin: Vec<Arc<dyn ValueDecoder>>,
    overrides: HashMap<Kind, Option<KindDecodeFn>>,
}

impl Default for DecoderChain {
    fn default() -> Self {
        Self {
            custom: Vec::new(),
            builtin: vec![Arc::new(TimestampDecoder) as Arc<dyn ValueDecoder>],
            overrides: HashMap::new(),
        }
    }
}

impl fmt::Debug for DecoderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderChain")
            .field("custom", &self.custom.len())
            .field("builtin", &self.builtin.len())
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DecoderChain {
    /// Append a custom decoder; earlier registrations win.
    pub fn register_value_decoder(&mut self, decoder: Arc<dyn ValueDecoder>) {
        self.custom.push(decoder);
    }

    /// Override the primitive decoder for `kind`; `None` disables the kind.
    pub fn register_decode_fn(&mut self, kind: Kind, decode: Option<KindDecodeFn>) {
        self.overrides.insert(kind, decode);
    }

    fn strategy(&self, shape: &Shape) -> Option<&Arc<dyn ValueDecoder>> {
        self.custom
            .iter()
            .chain(self.builtin.iter())
            .find(|d| d.decodes_type(shape))
    }

    /// Returns true if a strategy above the primitive table claims the described type, meaning
    /// it is decoded from a single string rather than expanded structurally.
    #[must_use]
    pub fn claims(&self, shape: &Shape) -> bool {
        if shape.kind == Kind::Interface {
            return false;
        }
        shape.is_decodable() || self.strategy(shape).is_some()
    }

    /// Decode `value` into a `T` through the first matching strategy.
    ///
    /// # Errors
    ///
    /// Returns the strategy's error, `Translated` for malformed literals, or `UnhandledType` when
    /// nothing handles `T` or the decoded value cannot be converted into `T`.
    pub fn decode_text<T: QueryDecode>(&self, value: &str) -> Result<T, BoxError> {
        let shape = T::shape();
        if shape.kind != Kind::Interface {
            if let Some(decoder) = self.strategy(&shape) {
                trace!(ty = shape.name, "decoding through value decoder");
                return convert::<T>(decoder.decode(value)?);
            }
            if let Some(decode) = T::query_param_decoder() {
                trace!(ty = shape.name, "decoding through query param hook");
                return decode(value).map_err(|e| DecodeError::Translated(e).into());
            }
        }
        let decoded = match self.overrides.get(&shape.kind) {
            Some(Some(decode)) => (decode.as_ref())(value)?,
            Some(None) => return Err(DecodeError::unhandled::<T>().into()),
            None => match primitive_decoder(shape.kind) {
                Some(decode) => decode(value)?,
                None => return Err(DecodeError::unhandled::<T>().into()),
            },
        };
        convert::<T>(decoded)
    }
}

fn convert<T: QueryDecode>(value: Box<dyn Any>) -> Result<T, BoxError> {
    T::convert(value).map_err(|_| DecodeError::unhandled::<T>().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_literals_follow_strconv() {
        for v in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(parse_bool(v).unwrap(), "{v}");
        }
        for v in ["0", "f", "F", "false", "FALSE", "False"] {
            assert!(!parse_bool(v).unwrap(), "{v}");
        }
        assert!(matches!(parse_bool("yes"), Err(DecodeError::Translated(_))));
    }

    #[test]
    fn int_widths_are_checked() {
        let v = int_value("-128", 8).unwrap();
        assert_eq!(v.downcast_ref::<i8>(), Some(&-128));
        let err = int_value("128", 8).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::Translated(_))
        ));
        let v = uint_value("300", 0).unwrap();
        assert_eq!(v.downcast_ref::<usize>(), Some(&300));
    }

    #[test]
    fn unknown_bit_sizes_are_reported() {
        let err = int_value("1", 24).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::UnsupportedBitSize { bits: 24 })
        ));
        assert!(uint_value("1", 128).is_err());
        assert!(float_value("1", 16).is_err());
    }

    #[test]
    fn primitive_table_covers_primitive_kinds_only() {
        assert!(primitive_decoder(Kind::Usize).is_some());
        assert!(primitive_decoder(Kind::String).is_some());
        assert!(primitive_decoder(Kind::Struct).is_none());
        assert!(primitive_decoder(Kind::Opaque).is_none());
    }

    #[test]
    fn overrides_replace_and_disable_kinds() {
        let mut chain = DecoderChain::default();
        let eleven: KindDecodeFn =
            Arc::new(|_: &str| Ok::<_, BoxError>(Box::new(String::from("11")) as Box<dyn Any>));
        chain.register_decode_fn(Kind::String, Some(eleven));
        assert_eq!(chain.decode_text::<String>("bb").unwrap(), "11");

        chain.register_decode_fn(Kind::String, None);
        let err = chain.decode_text::<String>("s").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::UnhandledType { .. })
        ));
    }

    #[test]
    fn timestamps_use_rfc3339() {
        let chain = DecoderChain::default();
        let ts = chain
            .decode_text::<OffsetDateTime>("2024-01-02T18:30:22Z")
            .unwrap();
        assert_eq!(ts.unix_timestamp(), 1_704_220_222);
        assert!(chain.decode_text::<OffsetDateTime>("2024-01-02").is_err());
    }
}
