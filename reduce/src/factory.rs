//! Enumerates the atomic-add instance family for a request.

use std::sync::Arc;

use crate::compat::{self, Compatibility};
use crate::config_space::TableSet;
use crate::error::Result;
use crate::instance::{DeviceReduce, MultiBlockAtomicAdd};
use crate::operator::OperatorTraits;
use crate::request::ReduceRequest;

/// Append one multi-block atomic-add instance per Tier1 × Tier2 pair of
/// `tables` to `instances`, Tier1 outer.
///
/// Existing entries are left untouched so several strategy families can fill
/// the same list. Nothing is appended when the strategy does not apply; the
/// returned [`Compatibility`] says why.
///
/// # Errors
///
/// Returns [`crate::Error::IndicesUnsupported`] if the request asks for indices.
#[tracing::instrument(skip_all, fields(request = %request, tables = %tables))]
pub fn add_multiblock_atomic_add_instances(
    request: &ReduceRequest,
    tables: TableSet,
    instances: &mut Vec<Arc<dyn DeviceReduce>>,
) -> Result<Compatibility> {
    let compatibility = compat::check(request)?;
    if !compatibility.is_accepted() {
        tracing::debug!(%compatibility, "atomic-add strategy does not apply");
        return Ok(compatibility);
    }

    let traits = OperatorTraits::resolve(request.operator(), request.nan(), request.indices());
    let request = Arc::new(request.clone());

    instances.reserve(tables.combinations());
    for tier1 in tables.tier1() {
        for tier2 in tables.tier2() {
            instances.push(Arc::new(MultiBlockAtomicAdd::new(Arc::clone(&request), *tier1, *tier2, traits)));
        }
    }

    tracing::debug!(added = tables.combinations(), total = instances.len(), "atomic-add instances added");
    Ok(compatibility)
}
