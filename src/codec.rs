use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::{BTreeMap, HashMap};

use time::OffsetDateTime;

use crate::container::child_key;
use crate::decode::Decoder;
use crate::error::{BoxError, DecodeError};
use crate::shape::{Kind, Shape};
use crate::trace::trace;

/// Decode a value from bracket-notation query parameters.
///
/// Implemented for the std scalars, `String`, [`OffsetDateTime`], `Option`, `Box`, arrays, `Vec`,
/// `HashMap`, `BTreeMap` and [`DynValue`]. Structs and newtypes use `#[derive(QueryDecode)]`.
pub trait QueryDecode: Sized + 'static {
    /// Structural category used for dispatch and the primitive table.
    const KIND: Kind;

    /// The zero value a lazily allocated destination starts from, or `None` if this type has
    /// none.
    fn zero_value() -> Option<Self>;

    /// Returns true if a decoded value of type `id` can be converted into `Self`.
    fn converts_from(id: TypeId) -> bool {
        id == TypeId::of::<Self>()
    }

    /// Convert a decoded value into `Self`, handing it back if it has another type.
    ///
    /// # Errors
    ///
    /// Returns the original box when the value cannot be converted.
    fn convert(value: Box<dyn Any>) -> Result<Self, Box<dyn Any>> {
        value.downcast::<Self>().map(|v| *v)
    }

    /// The self-describing decode hook, if this type decodes itself from one string.
    fn query_param_decoder() -> Option<fn(&str) -> Result<Self, BoxError>> {
        None
    }

    /// Populate `self` from the keys at and below `prefix`, returning whether any key was used.
    ///
    /// The default treats `Self` as a scalar stored at exactly `prefix`.
    ///
    /// # Errors
    ///
    /// Returns the first failure met while decoding.
    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        de.decode_scalar(self, prefix)
    }

    /// Runtime descriptor of `Self`.
    fn shape() -> Shape {
        Shape::of::<Self>()
    }
}

/// Types that decode themselves from a single unescaped string.
///
/// Enable with `#[derive(QueryDecode)] #[query(param)]`; the type must also implement `Default`.
pub trait QueryParam {
    /// Replace `self` with the value described by `value`.
    ///
    /// # Errors
    ///
    /// Returns the type's own error if `value` is malformed.
    fn unmarshal_query_param(&mut self, value: &str) -> Result<(), BoxError>;
}

/// Allocate `T::default()` and run its [`QueryParam`] hook on it.
///
/// # Errors
///
/// Returns the hook's error.
pub fn decode_param<T: QueryParam + Default>(value: &str) -> Result<T, BoxError> {
    let mut out = T::default();
    out.unmarshal_query_param(value)?;
    Ok(out)
}

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl QueryDecode for $ty {
                const KIND: Kind = Kind::$kind;

                fn zero_value() -> Option<Self> {
                    Some(<$ty>::default())
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
}

impl QueryDecode for OffsetDateTime {
    const KIND: Kind = Kind::Opaque;

    fn zero_value() -> Option<Self> {
        Some(Self::UNIX_EPOCH)
    }
}

impl<T: QueryDecode> QueryDecode for Option<T> {
    const KIND: Kind = Kind::Pointer;

    fn zero_value() -> Option<Self> {
        Some(None)
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        if let Some(inner) = self {
            return de.decode(inner, prefix);
        }
        if !de.contains(prefix) {
            return Ok(false);
        }
        trace!(prefix, ty = core::any::type_name::<T>(), "allocating pointee");
        let inner = self.insert(de.zero::<T>()?);
        de.decode(inner, prefix)
    }
}

impl<T: QueryDecode> QueryDecode for Box<T> {
    const KIND: Kind = Kind::Pointer;

    fn zero_value() -> Option<Self> {
        T::zero_value().map(Box::new)
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        de.decode(&mut **self, prefix)
    }
}

impl<T: QueryDecode, const N: usize> QueryDecode for [T; N] {
    const KIND: Kind = Kind::Array;

    fn zero_value() -> Option<Self> {
        let items = (0..N)
            .map(|_| T::zero_value())
            .collect::<Option<Vec<T>>>()?;
        items.try_into().ok()
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        let mut found = false;
        for (i, item) in self.iter_mut().enumerate() {
            found |= de.decode(item, &child_key(prefix, &i.to_string()))?;
        }
        Ok(found)
    }
}

impl<T: QueryDecode + Clone> QueryDecode for Vec<T> {
    const KIND: Kind = Kind::Slice;

    fn zero_value() -> Option<Self> {
        Some(Self::new())
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        let indices = de.lookup_indices(prefix)?;
        let Some(&max) = indices.last() else {
            return Ok(false);
        };
        let len = max + 1;

        // Decode into a copy so a failure leaves `self` as it was.
        let mut fresh: Self = self.iter().take(len).cloned().collect();
        while fresh.len() < len {
            fresh.push(de.zero::<T>()?);
        }

        let mut found = false;
        for i in indices {
            found |= de.decode(&mut fresh[i], &child_key(prefix, &i.to_string()))?;
        }
        if found {
            *self = fresh;
        }
        Ok(found)
    }
}

impl<K, V, S> QueryDecode for HashMap<K, V, S>
where
    K: QueryDecode + Eq + Hash,
    V: QueryDecode,
    S: BuildHasher + Default + 'static,
{
    const KIND: Kind = Kind::Map;

    fn zero_value() -> Option<Self> {
        Some(Self::default())
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        match de.decode_entries::<K, V>(prefix)? {
            Some(entries) => {
                *self = entries.into_iter().collect();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<K, V> QueryDecode for BTreeMap<K, V>
where
    K: QueryDecode + Ord,
    V: QueryDecode,
{
    const KIND: Kind = Kind::Map;

    fn zero_value() -> Option<Self> {
        Some(Self::new())
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        match de.decode_entries::<K, V>(prefix)? {
            Some(entries) => {
                *self = entries.into_iter().collect();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Object-safe view of [`QueryDecode`], used to hold a concrete value behind a [`DynValue`].
pub trait DynQueryDecode: Any {
    /// Decode the held value in place.
    ///
    /// # Errors
    ///
    /// Returns the first failure met while decoding.
    fn decode_dyn(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError>;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: QueryDecode> DynQueryDecode for T {
    fn decode_dyn(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        de.decode(self, prefix)
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A type-erased destination.
///
/// An empty value has no concrete type to decode into and is left alone.
#[derive(Default)]
pub struct DynValue(Option<Box<dyn DynQueryDecode>>);

impl DynValue {
    /// Hold `value`.
    #[must_use]
    pub fn new<T: QueryDecode>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// A value with no concrete type.
    #[must_use]
    pub const fn empty() -> Self {
        Self(None)
    }

    /// Returns true if no concrete value is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the held value as `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_deref()?.as_any().downcast_ref()
    }

    /// Mutably borrow the held value as `T`.
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()?.as_any_mut().downcast_mut()
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "DynValue({})", v.type_name()),
            None => f.write_str("DynValue(<empty>)"),
        }
    }
}

impl QueryDecode for DynValue {
    const KIND: Kind = Kind::Interface;

    fn zero_value() -> Option<Self> {
        Some(Self::empty())
    }

    fn decode_structure(&mut self, de: &Decoder<'_>, prefix: &str) -> Result<bool, DecodeError> {
        match &mut self.0 {
            Some(inner) => inner.decode_dyn(de, prefix),
            None => Ok(false),
        }
    }
}
