//! Generators for property-based testing.

use proptest::prelude::*;
use proptest::sample::{select, subsequence};
use strum::IntoEnumIterator;

use redcat_dtype::test::generators::{atomic_float_dtype, non_atomic_dtype, scalar_generator};

use crate::{DType, IndicesPolicy, NanPropagation, ReduceOperator, ReduceRequest, TableSet};

pub fn arb_operator() -> impl Strategy<Value = ReduceOperator> {
    select(ReduceOperator::iter().collect::<Vec<_>>())
}

/// Operators whose partial results merge by addition or multiplication.
pub fn arb_atomic_operator() -> impl Strategy<Value = ReduceOperator> {
    select(ReduceOperator::iter().filter(ReduceOperator::supports_atomic_add).collect::<Vec<_>>())
}

pub fn arb_tables() -> impl Strategy<Value = TableSet> {
    select(TableSet::iter().collect::<Vec<_>>())
}

/// Rank and a non-empty sorted subset of its axes.
pub fn arb_axes() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..=6).prop_flat_map(|rank| (Just(rank), subsequence((0..rank).collect::<Vec<_>>(), 1..=rank)))
}

fn build_request(
    (in_dtype, out_dtype): (DType, DType),
    operator: ReduceOperator,
    (rank, reduce_dims): (usize, Vec<usize>),
    nan: bool,
    indices: bool,
) -> ReduceRequest {
    ReduceRequest::builder()
        .in_dtype(in_dtype)
        .acc_dtype(out_dtype)
        .out_dtype(out_dtype)
        .rank(rank)
        .reduce_dims(reduce_dims)
        .operator(operator)
        .nan(NanPropagation::from(nan))
        .indices(IndicesPolicy::from(indices))
        .build()
        .unwrap()
}

/// Any request without indices.
pub fn arb_request() -> impl Strategy<Value = ReduceRequest> {
    ((scalar_generator(), scalar_generator()), arb_operator(), arb_axes(), any::<bool>())
        .prop_map(|(dtypes, operator, axes, nan)| build_request(dtypes, operator, axes, nan, false))
}

/// Requests the atomic-add gate accepts.
pub fn arb_accepted_request() -> impl Strategy<Value = ReduceRequest> {
    ((scalar_generator(), atomic_float_dtype()), arb_atomic_operator(), arb_axes(), any::<bool>())
        .prop_map(|(dtypes, operator, axes, nan)| build_request(dtypes, operator, axes, nan, false))
}

/// Atomic-add operators writing a type without hardware atomic add.
pub fn arb_non_atomic_output_request() -> impl Strategy<Value = ReduceRequest> {
    ((scalar_generator(), non_atomic_dtype()), arb_atomic_operator(), arb_axes(), any::<bool>())
        .prop_map(|(dtypes, operator, axes, nan)| build_request(dtypes, operator, axes, nan, false))
}

/// Requests asking for indices, of any operator.
pub fn arb_indices_request() -> impl Strategy<Value = ReduceRequest> {
    ((scalar_generator(), scalar_generator()), arb_operator(), arb_axes(), any::<bool>())
        .prop_map(|(dtypes, operator, axes, nan)| build_request(dtypes, operator, axes, nan, true))
}

/// Input lengths for `rank` axes: small extents with up to two large ones.
pub fn arb_lengths(rank: usize) -> impl Strategy<Value = Vec<usize>> {
    let large = (0..rank, select(vec![128usize, 256, 1024, 4096]));
    (proptest::collection::vec(1usize..=16, rank), proptest::collection::vec(large, 0..=2)).prop_map(
        |(mut lengths, large)| {
            for (axis, length) in large {
                lengths[axis] = length;
            }
            lengths
        },
    )
}
