//! Boundary to the reduction kernel that runs on the accelerator.
//!
//! Instances never touch device memory. They validate a call, derive its
//! launch geometry, and hand a [`LaunchParams`] to a [`ReductionKernel`]
//! implementation supplied by the execution layer.

use redcat_dtype::DType;

use crate::config_space::{Tier1Config, Tier2Config};
use crate::error::KernelError;
use crate::operator::OperatorTraits;

/// Opaque device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DevicePtr(pub u64);

impl DevicePtr {
    pub const fn address(&self) -> u64 {
        self.0
    }

    pub const fn is_aligned(&self, alignment: usize) -> bool {
        self.0 % alignment as u64 == 0
    }
}

/// Device buffers and scalar extras of one reduction call.
///
/// The output buffer must already hold the identity of the operator's
/// combine (see [`crate::instance::DeviceReduce::output_init_value`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReduceBuffers {
    pub input: DevicePtr,
    pub output: DevicePtr,
    pub workspace: Option<DevicePtr>,
    /// Scale applied to each result.
    pub alpha: f32,
}

impl ReduceBuffers {
    pub fn new(input: DevicePtr, output: DevicePtr) -> Self {
        Self { input, output, workspace: None, alpha: 1.0 }
    }

    pub fn with_workspace(mut self, workspace: DevicePtr) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Everything a reduction kernel needs for one launch.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchParams {
    pub name: String,
    pub in_dtype: DType,
    pub acc_dtype: DType,
    pub out_dtype: DType,
    pub tier1: Tier1Config,
    pub tier2: Tier2Config,
    pub traits: OperatorTraits,
    /// Divisor for [`crate::operator::AccElementwise::Divide`].
    pub divisor: Option<usize>,
    pub invariant_total: usize,
    pub reduce_total: usize,
    /// Blocks cooperating on one M tile, each merging its partial by atomic add.
    pub block_group_size: usize,
    /// K tiles each block walks.
    pub k_tile_iterations: usize,
    pub grid_size: usize,
    pub buffers: ReduceBuffers,
}

/// Handle of a submitted launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaunchHandle {
    pub id: u64,
}

/// Reduction kernel implementation on some accelerator.
///
/// Implementations must merge the partial results of the `block_group_size`
/// blocks sharing an output element by atomic addition, and must not signal
/// completion before every such addition has landed.
pub trait ReductionKernel: Send + Sync {
    /// Submit one launch. Errors are reported synchronously and never retried.
    fn launch(&self, params: &LaunchParams) -> Result<LaunchHandle, KernelError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
