//! Kernel instances and the multi-block atomic-add family.
//!
//! A multi-block atomic-add instance splits the reduced (K) extent of every
//! M tile across up to [`MAX_BLOCK_GROUP_SIZE`] blocks. Each block reduces its
//! share and atomically adds the partial into the output element, so no
//! second pass is needed. The price is that outputs must be pre-initialized
//! and only atomic-add-safe operators and output types are accepted.

use std::fmt;
use std::sync::Arc;

use snafu::{OptionExt, ResultExt, ensure};

use crate::config_space::{Tier1Config, Tier2Config, VectorDim};
use crate::descriptor::{ReduceDescriptor, ReduceShape};
use crate::error::{
    InvalidDescriptorSnafu, LaunchSnafu, MisalignedBufferSnafu, Result, UnsupportedArgumentSnafu,
};
use crate::kernel::{LaunchHandle, LaunchParams, ReduceBuffers, ReductionKernel};
use crate::operator::OperatorTraits;
use crate::request::ReduceRequest;

/// Upper bound on blocks sharing one M tile.
pub const MAX_BLOCK_GROUP_SIZE: usize = 128;

/// Runtime-selectable reduction instance.
///
/// Instances are immutable once built and may be shared across threads.
pub trait DeviceReduce: Send + Sync + fmt::Debug {
    fn request(&self) -> &ReduceRequest;

    /// Block-level and per-thread tiling of this instance.
    fn tiling(&self) -> (Tier1Config, Tier2Config);

    fn traits(&self) -> &OperatorTraits;

    /// Launch geometry for `desc`. Fails if `desc` does not match the request.
    fn layout(&self, desc: &ReduceDescriptor) -> Result<ReduceLayout>;

    /// Capability check against a layout previously derived from `desc`.
    fn supports_layout(&self, desc: &ReduceDescriptor, layout: &ReduceLayout) -> bool;

    /// Capability check against concrete shapes, strides and alignment.
    fn is_supported(&self, desc: &ReduceDescriptor) -> bool {
        self.layout(desc).is_ok_and(|layout| self.supports_layout(desc, &layout))
    }

    /// Scratch memory the launch needs.
    fn workspace_bytes(&self, _layout: &ReduceLayout) -> usize {
        0
    }

    /// Value the output buffer must hold before launch.
    fn output_init_value(&self) -> f64;

    /// Validate the call and submit it to `kernel`.
    fn launch(
        &self,
        desc: &ReduceDescriptor,
        buffers: &ReduceBuffers,
        kernel: &dyn ReductionKernel,
    ) -> Result<LaunchHandle>;

    /// Stable name encoding the tiling parameters.
    fn type_string(&self) -> String;
}

/// Launch geometry of one instance for one concrete descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReduceLayout {
    pub shape: ReduceShape,
    /// Output elements covered by one block.
    pub m_tile: usize,
    /// Reduced elements consumed by one block per iteration.
    pub k_tile: usize,
    pub k_tile_iterations: usize,
    pub block_group_size: usize,
    pub grid_size: usize,
}

impl ReduceLayout {
    pub fn new(shape: ReduceShape, tier1: &Tier1Config, tier2: &Tier2Config) -> Result<Self> {
        let m_tile = tier1.m_thread_cluster_size * tier2.m_slice_size;
        let k_tile = tier1.k_thread_cluster_size * tier2.k_slice_size;

        // Fewest iterations keeping the block group within MAX_BLOCK_GROUP_SIZE.
        let k_tile_iterations = shape.reduce_total.div_ceil(k_tile * MAX_BLOCK_GROUP_SIZE).max(1);
        let block_group_size = shape.reduce_total.div_ceil(k_tile * k_tile_iterations);
        let grid_size = shape
            .invariant_total
            .div_ceil(m_tile)
            .checked_mul(block_group_size)
            .context(InvalidDescriptorSnafu { reason: "grid size overflows usize" })?;

        Ok(Self { shape, m_tile, k_tile, k_tile_iterations, block_group_size, grid_size })
    }
}

/// Multi-block reduction merging partial results by atomic addition.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiBlockAtomicAdd {
    request: Arc<ReduceRequest>,
    tier1: Tier1Config,
    tier2: Tier2Config,
    traits: OperatorTraits,
}

impl MultiBlockAtomicAdd {
    pub(crate) fn new(
        request: Arc<ReduceRequest>,
        tier1: Tier1Config,
        tier2: Tier2Config,
        traits: OperatorTraits,
    ) -> Self {
        Self { request, tier1, tier2, traits }
    }

    fn vector_access_ok(&self, shape: &ReduceShape) -> bool {
        let vector = self.tier2.in_vector_size;
        match self.tier2.vector_dim {
            VectorDim::M => {
                shape.invariant_lowest_stride == Some(1) && shape.invariant_lowest % vector == 0
            }
            VectorDim::K => shape.reduce_lowest_stride == 1 && shape.reduce_lowest % vector == 0,
        }
    }

    fn alignment_ok(&self, desc: &ReduceDescriptor) -> bool {
        let in_access = self.tier2.in_vector_size * self.request.in_dtype().bytes();
        let out_access = self.tier2.out_vector_size * self.request.out_dtype().bytes();
        desc.input.alignment % in_access == 0 && desc.output.alignment % out_access == 0
    }
}

impl DeviceReduce for MultiBlockAtomicAdd {
    fn request(&self) -> &ReduceRequest {
        &self.request
    }

    fn tiling(&self) -> (Tier1Config, Tier2Config) {
        (self.tier1, self.tier2)
    }

    fn traits(&self) -> &OperatorTraits {
        &self.traits
    }

    fn layout(&self, desc: &ReduceDescriptor) -> Result<ReduceLayout> {
        let shape = ReduceShape::derive(&self.request, desc)?;
        ReduceLayout::new(shape, &self.tier1, &self.tier2)
    }

    fn supports_layout(&self, desc: &ReduceDescriptor, layout: &ReduceLayout) -> bool {
        let shape = &layout.shape;
        let out_vector = self.tier2.out_vector_size;

        if !self.vector_access_ok(shape) {
            return false;
        }
        if shape.invariant_lowest % out_vector != 0 || (out_vector > 1 && shape.out_lowest_stride != 1) {
            return false;
        }
        // Short reductions fit a single block and belong to another strategy.
        if shape.reduce_total <= self.tier1.block_size * self.tier2.k_slice_size {
            return false;
        }
        if shape.invariant_lowest % layout.m_tile != 0 {
            return false;
        }
        self.alignment_ok(desc)
    }

    fn output_init_value(&self) -> f64 {
        self.traits.combine.identity()
    }

    #[tracing::instrument(skip_all, fields(instance = %self.type_string(), kernel = kernel.name()))]
    fn launch(
        &self,
        desc: &ReduceDescriptor,
        buffers: &ReduceBuffers,
        kernel: &dyn ReductionKernel,
    ) -> Result<LaunchHandle> {
        let layout = self.layout(desc)?;
        ensure!(self.supports_layout(desc, &layout), UnsupportedArgumentSnafu { instance: self.type_string() });

        for (buffer, ptr, alignment) in
            [("input", buffers.input, desc.input.alignment), ("output", buffers.output, desc.output.alignment)]
        {
            ensure!(ptr.is_aligned(alignment), MisalignedBufferSnafu { buffer, address: ptr.address(), alignment });
        }

        let params = LaunchParams {
            name: self.type_string(),
            in_dtype: self.request.in_dtype(),
            acc_dtype: self.request.acc_dtype(),
            out_dtype: self.request.out_dtype(),
            tier1: self.tier1,
            tier2: self.tier2,
            traits: self.traits,
            divisor: self.traits.acc_elementwise.divisor(layout.shape.reduce_total),
            invariant_total: layout.shape.invariant_total,
            reduce_total: layout.shape.reduce_total,
            block_group_size: layout.block_group_size,
            k_tile_iterations: layout.k_tile_iterations,
            grid_size: layout.grid_size,
            buffers: *buffers,
        };

        tracing::debug!(
            grid_size = params.grid_size,
            block_group_size = params.block_group_size,
            k_tile_iterations = params.k_tile_iterations,
            "launching atomic-add reduction"
        );
        kernel.launch(&params).context(LaunchSnafu { instance: params.name.clone() })
    }

    fn type_string(&self) -> String {
        let Tier1Config { block_size, m_thread_cluster_size, k_thread_cluster_size } = self.tier1;
        let Tier2Config { vector_dim, in_vector_size, out_vector_size, m_slice_size, k_slice_size } = self.tier2;
        format!(
            "DeviceReduceMultiBlockAtomicAdd<{block_size},M_C{m_thread_cluster_size}_S{m_slice_size},\
             K_C{k_thread_cluster_size}_S{k_slice_size},InSrcVectorDim_{}_InSrcVectorSize_{in_vector_size}\
             _OutDstVectorSize_{out_vector_size}>",
            vector_dim.index()
        )
    }
}
