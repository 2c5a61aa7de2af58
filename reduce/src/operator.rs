//! Reduction operators and the traits they resolve to.
//!
//! An operator is lowered to three pieces the reduction kernel understands:
//! an elementwise map applied to every input element, an associative binary
//! combine, and an elementwise map applied to the accumulated value before it
//! is written out.

use enumset::{EnumSet, enum_set};

/// Reduction operator, numbered by its stable registration id.
#[derive(Debug, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::FromRepr, strum::Display)]
#[derive(enumset::EnumSetType)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[enumset(repr = "u8")]
pub enum ReduceOperator {
    Add = 0,
    Mul = 1,
    Min = 2,
    Max = 3,
    /// Maximum of absolute values.
    AMax = 4,
    Avg = 5,
    /// Sum of absolute values.
    Norm1 = 6,
    /// Square root of the sum of squares.
    Norm2 = 7,
}

/// Operators whose partial results may be merged by atomic addition.
pub const ATOMIC_ADD_OPERATORS: EnumSet<ReduceOperator> =
    enum_set!(ReduceOperator::Add | ReduceOperator::Mul | ReduceOperator::Avg | ReduceOperator::Norm1);

/// Operators that can report the position of the selected element.
pub const INDEXABLE_OPERATORS: EnumSet<ReduceOperator> =
    enum_set!(ReduceOperator::Min | ReduceOperator::Max | ReduceOperator::AMax);

impl ReduceOperator {
    pub fn is_indexable(&self) -> bool {
        INDEXABLE_OPERATORS.contains(*self)
    }

    pub fn supports_atomic_add(&self) -> bool {
        ATOMIC_ADD_OPERATORS.contains(*self)
    }
}

/// NaN handling policy, numbered by registration id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(strum::FromRepr, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NanPropagation {
    #[default]
    NotPropagate = 0,
    Propagate = 1,
}

impl NanPropagation {
    pub const fn propagates(&self) -> bool {
        matches!(self, Self::Propagate)
    }
}

impl From<bool> for NanPropagation {
    fn from(propagate: bool) -> Self {
        if propagate { Self::Propagate } else { Self::NotPropagate }
    }
}

/// Index output policy, numbered by registration id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(strum::FromRepr, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndicesPolicy {
    #[default]
    NoIndices = 0,
    /// Indices into the flattened reduced extent.
    Flattened = 1,
}

impl IndicesPolicy {
    pub const fn requested(&self) -> bool {
        matches!(self, Self::Flattened)
    }
}

impl From<bool> for IndicesPolicy {
    fn from(requested: bool) -> Self {
        if requested { Self::Flattened } else { Self::NoIndices }
    }
}

/// Associative combine applied between accumulated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryCombine {
    Add,
    Mul,
    Min,
    Max,
}

impl BinaryCombine {
    /// Neutral element. Output memory must hold this value before an
    /// atomic-add launch.
    pub const fn identity(&self) -> f64 {
        match self {
            Self::Add => 0.0,
            Self::Mul => 1.0,
            Self::Min => f64::INFINITY,
            Self::Max => f64::NEG_INFINITY,
        }
    }

    pub fn combine(&self, acc: f64, value: f64, nan: NanPropagation) -> f64 {
        match self {
            Self::Add => acc + value,
            Self::Mul => acc * value,
            Self::Min | Self::Max if nan.propagates() && (acc.is_nan() || value.is_nan()) => f64::NAN,
            Self::Min => acc.min(value),
            Self::Max => acc.max(value),
        }
    }
}

/// Map applied to each input element before combining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InElementwise {
    PassThrough,
    Abs,
    Square,
}

impl InElementwise {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::PassThrough => x,
            Self::Abs => x.abs(),
            Self::Square => x * x,
        }
    }
}

/// Map applied to the accumulated value before it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccElementwise {
    PassThrough,
    /// Divide by the number of reduced elements.
    Divide,
    Sqrt,
}

impl AccElementwise {
    pub fn apply(&self, acc: f64, reduce_length: usize) -> f64 {
        match self {
            Self::PassThrough => acc,
            Self::Divide => acc / reduce_length as f64,
            Self::Sqrt => acc.sqrt(),
        }
    }

    /// Scalar argument the kernel needs for this map, if any.
    pub const fn divisor(&self, reduce_length: usize) -> Option<usize> {
        match self {
            Self::Divide => Some(reduce_length),
            Self::PassThrough | Self::Sqrt => None,
        }
    }
}

/// Kernel-facing semantics of a reduction operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperatorTraits {
    pub combine: BinaryCombine,
    pub in_elementwise: InElementwise,
    pub acc_elementwise: AccElementwise,
    pub propagate_nan: bool,
    pub is_indexable: bool,
    pub needs_indices: bool,
}

impl OperatorTraits {
    pub fn resolve(operator: ReduceOperator, nan: NanPropagation, indices: IndicesPolicy) -> Self {
        use AccElementwise as Acc;
        use InElementwise as In;
        use ReduceOperator::*;

        let (combine, in_elementwise, acc_elementwise) = match operator {
            Add => (BinaryCombine::Add, In::PassThrough, Acc::PassThrough),
            Mul => (BinaryCombine::Mul, In::PassThrough, Acc::PassThrough),
            Min => (BinaryCombine::Min, In::PassThrough, Acc::PassThrough),
            Max => (BinaryCombine::Max, In::PassThrough, Acc::PassThrough),
            AMax => (BinaryCombine::Max, In::Abs, Acc::PassThrough),
            Avg => (BinaryCombine::Add, In::PassThrough, Acc::Divide),
            Norm1 => (BinaryCombine::Add, In::Abs, Acc::PassThrough),
            Norm2 => (BinaryCombine::Add, In::Square, Acc::Sqrt),
        };

        let is_indexable = operator.is_indexable();
        Self {
            combine,
            in_elementwise,
            acc_elementwise,
            propagate_nan: nan.propagates(),
            is_indexable,
            needs_indices: is_indexable && indices.requested(),
        }
    }
}
