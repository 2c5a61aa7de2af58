//! Concrete tensor descriptors checked against a request at dispatch time.

use smallvec::smallvec;
use snafu::ensure;

use crate::error::{InvalidDescriptorSnafu, Result};
use crate::request::{Axes, ReduceRequest};

/// Base alignment assumed for freshly allocated device buffers.
pub const DEFAULT_ALIGNMENT: usize = 256;

/// Shape, element strides and base alignment (bytes) of one tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDescriptor {
    pub lengths: Axes,
    pub strides: Axes,
    pub alignment: usize,
}

impl TensorDescriptor {
    pub fn new(lengths: &[usize], strides: &[usize]) -> Self {
        Self { lengths: lengths.into(), strides: strides.into(), alignment: DEFAULT_ALIGNMENT }
    }

    /// Row-major packed tensor.
    ///
    /// Strides saturate when the element count overflows `usize`; such
    /// descriptors are rejected by [`ReduceShape::derive`].
    pub fn contiguous(lengths: &[usize]) -> Self {
        let mut strides: Axes = smallvec![1; lengths.len()];
        for axis in (0..lengths.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1].saturating_mul(lengths[axis + 1]);
        }
        Self { lengths: lengths.into(), strides, alignment: DEFAULT_ALIGNMENT }
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    pub fn element_count(&self) -> usize {
        self.lengths.iter().product()
    }
}

/// Input and output tensors of one reduction call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReduceDescriptor {
    pub input: TensorDescriptor,
    pub output: TensorDescriptor,
}

impl ReduceDescriptor {
    pub fn new(input: TensorDescriptor, output: TensorDescriptor) -> Self {
        Self { input, output }
    }

    /// Packed input of `in_lengths` with the packed output `request` implies.
    pub fn contiguous(request: &ReduceRequest, in_lengths: &[usize]) -> Self {
        let out_lengths: Axes = match request.invariant_dims().as_slice() {
            [] => smallvec![1],
            dims => dims.iter().filter_map(|&axis| in_lengths.get(axis).copied()).collect(),
        };
        Self { input: TensorDescriptor::contiguous(in_lengths), output: TensorDescriptor::contiguous(&out_lengths) }
    }
}

/// Tiling-independent view of a reduction: the input folded into a surviving
/// (M) extent and a reduced (K) extent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReduceShape {
    pub invariant_total: usize,
    pub reduce_total: usize,
    /// Length of the innermost surviving axis, 1 when every axis is reduced.
    pub invariant_lowest: usize,
    /// Length of the innermost reduced axis.
    pub reduce_lowest: usize,
    /// Input stride of the innermost surviving axis.
    pub invariant_lowest_stride: Option<usize>,
    /// Input stride of the innermost reduced axis.
    pub reduce_lowest_stride: usize,
    /// Stride of the innermost output axis.
    pub out_lowest_stride: usize,
}

impl ReduceShape {
    /// Fold `desc` according to `request`, validating that the two agree.
    pub fn derive(request: &ReduceRequest, desc: &ReduceDescriptor) -> Result<Self> {
        let input = &desc.input;
        let output = &desc.output;
        let rank = request.rank();

        ensure!(
            input.rank() == rank && input.strides.len() == rank,
            InvalidDescriptorSnafu {
                reason: format!(
                    "input has {} lengths and {} strides, request rank is {rank}",
                    input.rank(),
                    input.strides.len()
                )
            }
        );
        ensure!(
            input.lengths.iter().all(|&len| len > 0),
            InvalidDescriptorSnafu { reason: format!("input lengths {:?} contain zero", input.lengths.as_slice()) }
        );
        ensure!(
            input.alignment.is_power_of_two() && output.alignment.is_power_of_two(),
            InvalidDescriptorSnafu {
                reason: format!("alignments {} and {} must be powers of two", input.alignment, output.alignment)
            }
        );

        let invariant_dims = request.invariant_dims();
        let expected_out: Axes = match invariant_dims.as_slice() {
            [] => smallvec![1],
            dims => dims.iter().map(|&axis| input.lengths[axis]).collect(),
        };
        ensure!(
            output.lengths == expected_out && output.strides.len() == output.lengths.len(),
            InvalidDescriptorSnafu {
                reason: format!(
                    "output lengths {:?} with {} strides, expected lengths {:?}",
                    output.lengths.as_slice(),
                    output.strides.len(),
                    expected_out.as_slice()
                )
            }
        );

        ensure!(
            checked_product(input.lengths.iter().copied()).is_some(),
            InvalidDescriptorSnafu { reason: "element count overflows usize" }
        );

        // Both factors of a representable element count are representable.
        let reduce_dims = request.reduce_dims();
        let reduce_total = reduce_dims.iter().map(|&axis| input.lengths[axis]).product();
        let invariant_total = invariant_dims.iter().map(|&axis| input.lengths[axis]).product();

        // reduce_dims is never empty for a validated request
        let reduce_last = reduce_dims[reduce_dims.len() - 1];
        let invariant_last = invariant_dims.last().copied();

        Ok(Self {
            invariant_total,
            reduce_total,
            invariant_lowest: invariant_last.map_or(1, |axis| input.lengths[axis]),
            reduce_lowest: input.lengths[reduce_last],
            invariant_lowest_stride: invariant_last.map(|axis| input.strides[axis]),
            reduce_lowest_stride: input.strides[reduce_last],
            out_lowest_stride: output.strides.last().copied().unwrap_or(1),
        })
    }
}

fn checked_product(lengths: impl IntoIterator<Item = usize>) -> Option<usize> {
    lengths.into_iter().try_fold(1usize, usize::checked_mul)
}
