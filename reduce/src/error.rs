//! Error types for catalog construction and instance dispatch.

use snafu::Snafu;

use crate::operator::ReduceOperator;

/// Result type for catalog operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error reported by an external reduction kernel.
pub type KernelError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Atomic-add combination cannot track the index of an extreme value.
    #[snafu(display("atomic-add reduction cannot produce indices (operator {operator})"))]
    IndicesUnsupported { operator: ReduceOperator },

    /// Request failed validation.
    #[snafu(display("invalid reduce request: {reason}"))]
    InvalidRequest { reason: String },

    /// Unknown registration identifier.
    #[snafu(display("unknown {kind} id: {id}"))]
    UnknownId { kind: &'static str, id: u32 },

    /// Concrete tensor descriptors do not fit the request.
    #[snafu(display("invalid reduce descriptor: {reason}"))]
    InvalidDescriptor { reason: String },

    /// No catalog instance accepts the concrete descriptors.
    #[snafu(display("no applicable instance among {candidates} candidates"))]
    NoApplicableInstance { candidates: usize },

    /// Instance asked to run a layout its capability check rejects.
    #[snafu(display("unsupported argument for {instance}"))]
    UnsupportedArgument { instance: String },

    /// Buffer address breaks the alignment declared by its descriptor.
    #[snafu(display("{buffer} buffer at {address:#x} is not aligned to {alignment} bytes"))]
    MisalignedBuffer { buffer: &'static str, address: u64, alignment: usize },

    /// Reduction kernel failed to launch.
    #[snafu(display("launch of {instance} failed: {source}"))]
    Launch { instance: String, source: KernelError },
}
