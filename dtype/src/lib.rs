pub mod ext;

#[cfg(any(test, feature = "proptest"))]
pub mod test;

use enumset::{EnumSet, enum_set};

/// Scalar element types of reduction tensors.
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::FromRepr, strum::Display)]
#[derive(enumset::EnumSetType)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[enumset(repr = "u32")]
pub enum DType {
    #[strum(to_string = "bool")]
    Bool = 0,

    // Interleaved signed/unsigned, narrowest first
    #[strum(to_string = "i8")]
    Int8 = 1,
    #[strum(to_string = "u8")]
    UInt8 = 2,
    #[strum(to_string = "i16")]
    Int16 = 3,
    #[strum(to_string = "u16")]
    UInt16 = 4,
    #[strum(to_string = "i32")]
    Int32 = 5,
    #[strum(to_string = "u32")]
    UInt32 = 6,
    #[strum(to_string = "i64")]
    Int64 = 7,
    #[strum(to_string = "u64")]
    UInt64 = 8,

    #[strum(to_string = "f16")]
    Float16 = 9,
    #[strum(to_string = "bf16")]
    BFloat16 = 10,
    #[strum(to_string = "f32")]
    Float32 = 11,
    #[strum(to_string = "f64")]
    Float64 = 12,
}

/// Types with a hardware atomic add usable for cross-block accumulation.
pub const ATOMIC_ADD_DTYPES: EnumSet<DType> = enum_set!(DType::Float32 | DType::Float64);

impl DType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 => 4,
            Self::Int64 | Self::UInt64 => 8,
            Self::Float16 | Self::BFloat16 => 2,
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Whether partial results of this type can be merged with an atomic add.
    pub fn supports_atomic_add(&self) -> bool {
        ATOMIC_ADD_DTYPES.contains(*self)
    }
}
