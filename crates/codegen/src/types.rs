//! The source-level type lattice and its projection onto WebAssembly value types.

use crate::program::ElementId;

/// Compilation target, determining the width of `usize` and of class references.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Target {
    /// 32-bit pointers, the default.
    #[default]
    Wasm32,
    /// 64-bit pointers.
    Wasm64,
}

impl Target {
    /// Size of a pointer (`sizeof(usize)`) in bytes.
    pub const fn pointer_size(self) -> u64 {
        match self {
            Self::Wasm32 => 4,
            Self::Wasm64 => 8,
        }
    }

    /// The `usize` type for this target.
    pub const fn usize_type(self) -> Type {
        match self {
            Self::Wasm32 => Type::Usize32,
            Self::Wasm64 => Type::Usize64,
        }
    }
}

/// One of the four WebAssembly value types, or none (statements, `void` results).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NativeType {
    /// A 32-bit integer.
    I32,
    /// A 64-bit integer.
    I64,
    /// A 32-bit float.
    F32,
    /// A 64-bit float.
    F64,
    /// No value.
    None,
}

/// A resolved source-level type.
///
/// Small integers (narrower than 32 bits) are represented as `i32` values with
/// explicit sign-extension or zero-masking inserted on production; `usize` and
/// class references are integers of the target's pointer width.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    /// The absence of a value.
    Void,
    /// A single-bit unsigned integer.
    Bool,
    /// An 8-bit signed integer.
    I8,
    /// A 16-bit signed integer.
    I16,
    /// A 32-bit signed integer.
    I32,
    /// A 64-bit signed integer.
    I64,
    /// An 8-bit unsigned integer.
    U8,
    /// A 16-bit unsigned integer.
    U16,
    /// A 32-bit unsigned integer.
    U32,
    /// A 64-bit unsigned integer.
    U64,
    /// A 32-bit pointer-sized unsigned integer.
    Usize32,
    /// A 64-bit pointer-sized unsigned integer.
    Usize64,
    /// A 32-bit float.
    F32,
    /// A 64-bit float.
    F64,
    /// A reference to a class instance, pointer-sized.
    Class {
        /// The class instance element this type refers to.
        element: ElementId,
        /// Whether references are 64 bits wide on the current target.
        ptr64: bool,
    },
}

impl Type {
    /// Size of this type in bits. `Void` has size zero.
    pub fn size(&self) -> u32 {
        match self {
            Self::Void => 0,
            Self::Bool => 1,
            Self::I8 | Self::U8 => 8,
            Self::I16 | Self::U16 => 16,
            Self::I32 | Self::U32 | Self::Usize32 | Self::F32 => 32,
            Self::I64 | Self::U64 | Self::Usize64 | Self::F64 => 64,
            Self::Class { ptr64, .. } => {
                if *ptr64 {
                    64
                } else {
                    32
                }
            }
        }
    }

    /// Whether this is `f32` or `f64`.
    pub fn is_any_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Whether this is any integer type, including `bool`, `usize` and class
    /// references.
    pub fn is_any_integer(&self) -> bool {
        !matches!(self, Self::Void | Self::F32 | Self::F64)
    }

    /// Whether this is a 64-bit integer.
    pub fn is_long_integer(&self) -> bool {
        matches!(self, Self::I64 | Self::U64 | Self::Usize64)
            || matches!(self, Self::Class { ptr64: true, .. })
    }

    /// Whether this is a signed integer. `usize`, `bool` and class references
    /// are unsigned.
    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Whether this is an integer narrower than 32 bits.
    pub fn is_small_integer(&self) -> bool {
        self.is_any_integer() && self.size() < 32
    }

    /// The shift distance of the `shl`/`shr` pair that sign-extends a small
    /// integer inside an `i32`.
    pub fn small_integer_shift(&self) -> u32 {
        debug_assert!(self.is_small_integer());
        32 - self.size()
    }

    /// The low-bits mask that zero-extends a small unsigned integer inside an
    /// `i32`.
    pub fn small_integer_mask(&self) -> u32 {
        debug_assert!(self.is_small_integer());
        (1u32 << self.size()) - 1
    }

    /// Projects this type onto a WebAssembly value type.
    pub fn native_type(&self) -> NativeType {
        match self {
            Self::Void => NativeType::None,
            Self::F32 => NativeType::F32,
            Self::F64 => NativeType::F64,
            ty if ty.is_long_integer() => NativeType::I64,
            _ => NativeType::I32,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Bool => f.write_str("bool"),
            Self::I8 => f.write_str("i8"),
            Self::I16 => f.write_str("i16"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::Usize32 | Self::Usize64 => f.write_str("usize"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Class { element, .. } => write!(f, "ref#{}", element.index()),
        }
    }
}
