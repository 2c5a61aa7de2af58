//! Tiling tables enumerated by the instance factory.
//!
//! Tier1 entries size a block and split its threads between the surviving (M)
//! and reduced (K) axes. Tier2 entries fix per-thread slices and vectorized
//! memory access widths. Tables only change which shapes get a vectorized
//! instance; they never change results.

/// Block-level tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tier1Config {
    pub block_size: usize,
    pub m_thread_cluster_size: usize,
    pub k_thread_cluster_size: usize,
}

impl Tier1Config {
    pub const fn new(block_size: usize, m_thread_cluster_size: usize, k_thread_cluster_size: usize) -> Self {
        Self { block_size, m_thread_cluster_size, k_thread_cluster_size }
    }

    /// `block_size == m_thread_cluster_size * k_thread_cluster_size`.
    pub const fn is_consistent(&self) -> bool {
        self.block_size == self.m_thread_cluster_size * self.k_thread_cluster_size
    }
}

/// Axis along which input loads are vectorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VectorDim {
    /// Surviving (invariant) axis.
    M,
    /// Reduced axis.
    K,
}

impl VectorDim {
    pub const fn index(&self) -> usize {
        match self {
            Self::M => 0,
            Self::K => 1,
        }
    }
}

/// Per-thread tiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tier2Config {
    pub vector_dim: VectorDim,
    pub in_vector_size: usize,
    pub out_vector_size: usize,
    pub m_slice_size: usize,
    pub k_slice_size: usize,
}

impl Tier2Config {
    pub const fn new(
        vector_dim: VectorDim,
        in_vector_size: usize,
        out_vector_size: usize,
        m_slice_size: usize,
        k_slice_size: usize,
    ) -> Self {
        Self { vector_dim, in_vector_size, out_vector_size, m_slice_size, k_slice_size }
    }
}

#[rustfmt::skip]
pub const TIER1_FULL: &[Tier1Config] = &[
    // BlockSize | MThreadClusterSize | KThreadClusterSize
    Tier1Config::new(256, 128, 2),
    Tier1Config::new(256, 64, 4),
    Tier1Config::new(256, 32, 8),
    Tier1Config::new(256, 16, 16),
    Tier1Config::new(256, 4, 64),
    Tier1Config::new(256, 1, 256),
];

pub const TIER1_QUICK: &[Tier1Config] = TIER1_FULL;

#[rustfmt::skip]
pub const TIER2_FULL: &[Tier2Config] = &[
    // VectorDim | InVectorSize | OutVectorSize | MSliceSize | KSliceSize
    Tier2Config::new(VectorDim::M, 4, 4, 8, 1),
    Tier2Config::new(VectorDim::M, 4, 4, 4, 1),
    Tier2Config::new(VectorDim::M, 2, 2, 2, 1),

    Tier2Config::new(VectorDim::K, 4, 1, 1, 8),
    Tier2Config::new(VectorDim::K, 4, 1, 1, 4),
    Tier2Config::new(VectorDim::K, 2, 1, 1, 2),

    // prime slices for extents no power of two divides
    Tier2Config::new(VectorDim::M, 1, 1, 3, 1),
    Tier2Config::new(VectorDim::M, 1, 1, 5, 1),
    Tier2Config::new(VectorDim::M, 1, 1, 7, 1),
    Tier2Config::new(VectorDim::M, 1, 1, 11, 1),

    Tier2Config::new(VectorDim::K, 1, 1, 1, 3),
    Tier2Config::new(VectorDim::K, 1, 1, 1, 5),
    Tier2Config::new(VectorDim::K, 1, 1, 1, 7),
    Tier2Config::new(VectorDim::K, 1, 1, 1, 11),
];

#[rustfmt::skip]
pub const TIER2_QUICK: &[Tier2Config] = &[
    Tier2Config::new(VectorDim::M, 2, 2, 2, 1),
    Tier2Config::new(VectorDim::M, 1, 1, 2, 1),
    Tier2Config::new(VectorDim::K, 2, 1, 1, 2),
    Tier2Config::new(VectorDim::K, 2, 2, 1, 2),
    Tier2Config::new(VectorDim::M, 1, 1, 3, 1),
    Tier2Config::new(VectorDim::K, 1, 1, 1, 3),
];

/// Which pair of tiling tables the factory enumerates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableSet {
    /// Production coverage.
    #[default]
    Full,
    /// Reduced tables for fast validation runs.
    Quick,
}

impl TableSet {
    pub const fn tier1(&self) -> &'static [Tier1Config] {
        match self {
            Self::Full => TIER1_FULL,
            Self::Quick => TIER1_QUICK,
        }
    }

    pub const fn tier2(&self) -> &'static [Tier2Config] {
        match self {
            Self::Full => TIER2_FULL,
            Self::Quick => TIER2_QUICK,
        }
    }

    /// Size of the Tier1 × Tier2 cross product.
    pub const fn combinations(&self) -> usize {
        self.tier1().len() * self.tier2().len()
    }
}
