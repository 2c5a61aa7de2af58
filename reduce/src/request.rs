//! Reduction requests: the signature a catalog is built for.

use std::fmt;

use bon::bon;
use redcat_dtype::DType;
use redcat_dtype::ext::HasDType;
use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{InvalidRequestSnafu, Result, UnknownIdSnafu};
use crate::operator::{IndicesPolicy, NanPropagation, ReduceOperator};

/// Axis list; reductions rarely touch more than four axes.
pub type Axes = SmallVec<[usize; 4]>;

/// Reduction signature. Two equal requests always yield identical catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReduceRequest {
    in_dtype: DType,
    acc_dtype: DType,
    out_dtype: DType,
    rank: usize,
    reduce_dims: Axes,
    operator: ReduceOperator,
    nan: NanPropagation,
    indices: IndicesPolicy,
}

/// Stable identifiers used by the registration layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestIds {
    pub operator: u32,
    pub nan: u32,
    pub indices: u32,
}

#[bon]
impl ReduceRequest {
    /// Validate and normalize a request.
    ///
    /// `reduce_dims` may be given in any order; it is stored ascending.
    /// Fails on rank 0, an empty axis list, an axis `>= rank`, or a duplicate axis.
    #[builder]
    pub fn new(
        in_dtype: DType,
        acc_dtype: DType,
        out_dtype: DType,
        rank: usize,
        #[builder(into)] reduce_dims: Vec<usize>,
        operator: ReduceOperator,
        #[builder(default, into)] nan: NanPropagation,
        #[builder(default, into)] indices: IndicesPolicy,
    ) -> Result<Self> {
        ensure!(rank > 0, InvalidRequestSnafu { reason: "rank must be at least 1" });
        ensure!(!reduce_dims.is_empty(), InvalidRequestSnafu { reason: "no axes to reduce" });

        let mut dims: Axes = reduce_dims.into_iter().collect();
        dims.sort_unstable();

        if let Some(&axis) = dims.iter().find(|&&axis| axis >= rank) {
            return InvalidRequestSnafu { reason: format!("axis {axis} out of range for rank {rank}") }.fail();
        }
        if let Some(pair) = dims.windows(2).find(|pair| pair[0] == pair[1]) {
            return InvalidRequestSnafu { reason: format!("axis {} listed twice", pair[0]) }.fail();
        }

        Ok(Self { in_dtype, acc_dtype, out_dtype, rank, reduce_dims: dims, operator, nan, indices })
    }
}

impl ReduceRequest {
    /// Request whose element types are those of Rust scalars `In`, `Acc` and `Out`,
    /// with default NaN and indices policies.
    ///
    /// ```ignore
    /// let request = ReduceRequest::typed::<f32, f32, f64>(4, &[1, 3], ReduceOperator::Add)?;
    /// ```
    pub fn typed<In: HasDType, Acc: HasDType, Out: HasDType>(
        rank: usize,
        reduce_dims: &[usize],
        operator: ReduceOperator,
    ) -> Result<Self> {
        Self::builder()
            .in_dtype(In::DTYPE)
            .acc_dtype(Acc::DTYPE)
            .out_dtype(Out::DTYPE)
            .rank(rank)
            .reduce_dims(reduce_dims.to_vec())
            .operator(operator)
            .build()
    }

    /// Build a request from registration identifiers.
    pub fn from_ids(
        in_dtype: DType,
        acc_dtype: DType,
        out_dtype: DType,
        rank: usize,
        reduce_dims: &[usize],
        ids: RequestIds,
    ) -> Result<Self> {
        let operator = ReduceOperator::from_repr(ids.operator as usize)
            .ok_or_else(|| UnknownIdSnafu { kind: "operator", id: ids.operator }.build())?;
        let nan = NanPropagation::from_repr(ids.nan as usize)
            .ok_or_else(|| UnknownIdSnafu { kind: "nan propagation", id: ids.nan }.build())?;
        let indices = IndicesPolicy::from_repr(ids.indices as usize)
            .ok_or_else(|| UnknownIdSnafu { kind: "indices", id: ids.indices }.build())?;

        Self::builder()
            .in_dtype(in_dtype)
            .acc_dtype(acc_dtype)
            .out_dtype(out_dtype)
            .rank(rank)
            .reduce_dims(reduce_dims.to_vec())
            .operator(operator)
            .nan(nan)
            .indices(indices)
            .build()
    }

    pub fn in_dtype(&self) -> DType {
        self.in_dtype
    }

    pub fn acc_dtype(&self) -> DType {
        self.acc_dtype
    }

    pub fn out_dtype(&self) -> DType {
        self.out_dtype
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Reduced (K) axes, ascending.
    pub fn reduce_dims(&self) -> &[usize] {
        &self.reduce_dims
    }

    /// Surviving (M) axes, ascending.
    pub fn invariant_dims(&self) -> Axes {
        (0..self.rank).filter(|axis| !self.reduce_dims.contains(axis)).collect()
    }

    pub fn operator(&self) -> ReduceOperator {
        self.operator
    }

    pub fn nan(&self) -> NanPropagation {
        self.nan
    }

    pub fn indices(&self) -> IndicesPolicy {
        self.indices
    }
}

impl fmt::Display for ReduceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}->{}->{}, rank {}, dims {:?}, nan {}, indices {})",
            self.operator,
            self.in_dtype,
            self.acc_dtype,
            self.out_dtype,
            self.rank,
            self.reduce_dims.as_slice(),
            self.nan,
            self.indices
        )
    }
}
