//! Gate deciding whether the atomic-add strategy applies to a request.

use snafu::ensure;

use crate::error::{IndicesUnsupportedSnafu, Result};
use crate::request::ReduceRequest;

/// Outcome of the atomic-add compatibility check.
///
/// Both rejections produce the same empty catalog; the variant only tells
/// callers and logs which rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Compatibility {
    Accepted,
    /// Operator is not associative under atomic addition of partials.
    UnsupportedOperator,
    /// Output type has no hardware atomic add.
    UnsupportedOutType,
}

impl Compatibility {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Check a request against the atomic-add strategy.
///
/// Requesting indices is a caller error and fails regardless of operator.
pub fn check(request: &ReduceRequest) -> Result<Compatibility> {
    ensure!(!request.indices().requested(), IndicesUnsupportedSnafu { operator: request.operator() });

    if !request.operator().supports_atomic_add() {
        return Ok(Compatibility::UnsupportedOperator);
    }
    if !request.out_dtype().supports_atomic_add() {
        return Ok(Compatibility::UnsupportedOutType);
    }
    Ok(Compatibility::Accepted)
}
