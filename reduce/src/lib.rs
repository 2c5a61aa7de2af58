//! Instance catalogs for multi-block atomic-add tensor reductions.
//!
//! Given a [`ReduceRequest`], the factory filters out operator and type
//! combinations that cannot be merged with atomic addition, resolves the
//! operator's kernel semantics, and enumerates one [`MultiBlockAtomicAdd`]
//! instance per pair of tiling configurations. A dispatcher then walks the
//! resulting [`Catalog`] and launches the first instance whose capability
//! check accepts the concrete tensors.
//!
//! # Module Organization
//!
//! - [`config_space`] - Tier1/Tier2 tiling tables
//! - [`operator`] - Operators and their resolved kernel traits
//! - [`request`] - Validated reduction signatures
//! - [`compat`] - Atomic-add compatibility gate
//! - [`descriptor`] - Concrete tensor descriptors
//! - [`instance`] - The `DeviceReduce` interface and its atomic-add implementation
//! - [`kernel`] - Boundary to the accelerator reduction kernel
//! - [`factory`] - Cross-product enumeration
//! - [`catalog`] - Ordered catalogs and first-match selection
//! - [`registry`] - Process-wide catalog cache
//! - [`config`] - Table selection

pub mod catalog;
pub mod compat;
pub mod config;
pub mod config_space;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod instance;
pub mod kernel;
pub mod operator;
pub mod registry;
pub mod request;


pub use catalog::{Catalog, Selection};
pub use compat::Compatibility;
pub use config::CatalogConfig;
pub use config_space::{TableSet, Tier1Config, Tier2Config, VectorDim};
pub use descriptor::{ReduceDescriptor, ReduceShape, TensorDescriptor};
pub use error::{Error, Result};
pub use factory::add_multiblock_atomic_add_instances;
pub use instance::{DeviceReduce, MultiBlockAtomicAdd, ReduceLayout};
pub use kernel::{DevicePtr, LaunchHandle, LaunchParams, ReduceBuffers, ReductionKernel};
pub use operator::{
    AccElementwise, BinaryCombine, InElementwise, IndicesPolicy, NanPropagation, OperatorTraits, ReduceOperator,
};
pub use registry::{CATALOGS, CatalogRegistry, global_catalog};
pub use request::{Axes, ReduceRequest, RequestIds};

pub use redcat_dtype::DType;
pub use redcat_dtype::ext::HasDType;
