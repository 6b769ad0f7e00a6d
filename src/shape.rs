use core::any::TypeId;
use core::fmt;

use crate::codec::QueryDecode;

/// Structural category of a destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Kind {
    /// `bool`.
    Bool,
    /// `i8`.
    I8,
    /// `i16`.
    I16,
    /// `i32`.
    I32,
    /// `i64`.
    I64,
    /// `isize`.
    Isize,
    /// `u8`.
    U8,
    /// `u16`.
    U16,
    /// `u32`.
    U32,
    /// `u64`.
    U64,
    /// `usize` (native width and address-sized).
    Usize,
    /// `f32`.
    F32,
    /// `f64`.
    F64,
    /// `String`.
    String,
    /// `Option<T>` / `Box<T>`.
    Pointer,
    /// [`DynValue`](crate::DynValue).
    Interface,
    /// `HashMap` / `BTreeMap`.
    Map,
    /// `[T; N]`.
    Array,
    /// `Vec<T>`.
    Slice,
    /// Derived struct.
    Struct,
    /// Any type decoded only through a strategy (timestamps, `#[query(param)]` types).
    Opaque,
}

impl Kind {
    /// Returns true for kinds the primitive table can decode; map keys and values must be one of these.
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::Isize
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::Usize
                | Self::F32
                | Self::F64
                | Self::String
        )
    }
}

/// Runtime descriptor of a destination type, handed to decoder strategies.
#[derive(Clone, Copy)]
pub struct Shape {
    /// The type's id.
    pub id: TypeId,
    /// The type's name, for diagnostics.
    pub name: &'static str,
    /// The structural category.
    pub kind: Kind,
    converts_from: fn(TypeId) -> bool,
    decodable: bool,
}

impl Shape {
    /// Describe `T`.
    #[must_use]
    pub fn of<T: QueryDecode>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
            kind: T::KIND,
            converts_from: T::converts_from,
            decodable: T::query_param_decoder().is_some(),
        }
    }

    /// Returns true if this is exactly `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Returns true if a value of type `T` can be converted into the described type.
    #[must_use]
    pub fn converts_from<T: 'static>(&self) -> bool {
        (self.converts_from)(TypeId::of::<T>())
    }

    /// Returns true if the type implements the self-describing decode protocol.
    #[must_use]
    pub const fn is_decodable(&self) -> bool {
        self.decodable
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("decodable", &self.decodable)
            .finish_non_exhaustive()
    }
}
