//! Layout arithmetic, capability checks and launch validation.

use std::sync::Arc;

use test_case::test_case;

use crate::test::helpers::*;
use crate::*;

const ROW_LENGTHS: [usize; 2] = [256, 4096];

fn row_catalog(operator: ReduceOperator) -> (Catalog, ReduceDescriptor) {
    let request = float_request(operator, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &ROW_LENGTHS);
    (Catalog::build(&request, TableSet::Full).unwrap(), desc)
}

fn instance(catalog: &Catalog, index: usize) -> &Arc<dyn DeviceReduce> {
    catalog.get(index).unwrap()
}

fn buffers() -> ReduceBuffers {
    ReduceBuffers::new(DevicePtr(0x10000), DevicePtr(0x20000))
}

#[test]
fn test_row_reduce_layout() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let layout = instance(&catalog, 3).layout(&desc).unwrap();

    assert_eq!(layout.m_tile, 128);
    assert_eq!(layout.k_tile, 16);
    assert_eq!(layout.k_tile_iterations, 2);
    assert_eq!(layout.block_group_size, 128);
    assert_eq!(layout.grid_size, 256);
}

#[test]
fn test_full_reduction_layout() {
    let request = float_request(ReduceOperator::Add, 1, &[0]);
    let desc = ReduceDescriptor::contiguous(&request, &[1_000_000]);
    let catalog = Catalog::build(&request, TableSet::Full).unwrap();
    let layout = instance(&catalog, 73).layout(&desc).unwrap();

    assert_eq!(layout.m_tile, 1);
    assert_eq!(layout.k_tile, 2048);
    assert_eq!(layout.k_tile_iterations, 4);
    assert_eq!(layout.block_group_size, 123);
    assert_eq!(layout.grid_size, 123);
}

#[test]
fn test_type_string() {
    let (catalog, _) = row_catalog(ReduceOperator::Add);
    assert_eq!(
        instance(&catalog, 0).type_string(),
        "DeviceReduceMultiBlockAtomicAdd<256,M_C128_S8,K_C2_S1,InSrcVectorDim_0_InSrcVectorSize_4_OutDstVectorSize_4>"
    );
    assert_eq!(
        instance(&catalog, 3).type_string(),
        "DeviceReduceMultiBlockAtomicAdd<256,M_C128_S1,K_C2_S8,InSrcVectorDim_1_InSrcVectorSize_4_OutDstVectorSize_1>"
    );
}

#[test_case(0, false ; "m vector on contiguous reduce axis")]
#[test_case(3, true ; "k vector of four")]
#[test_case(5, true ; "k vector of two")]
fn test_row_reduce_support(index: usize, expected: bool) {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    assert_eq!(instance(&catalog, index).is_supported(&desc), expected);
}

#[test]
fn test_short_reduction_not_supported() {
    let request = float_request(ReduceOperator::Add, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &[256, 64]);
    let catalog = Catalog::build(&request, TableSet::Full).unwrap();
    assert!(catalog.iter().all(|instance| !instance.is_supported(&desc)));
}

#[test]
fn test_strided_output_blocks_vector_store() {
    let request = float_request(ReduceOperator::Add, 2, &[0]);
    let catalog = Catalog::build(&request, TableSet::Full).unwrap();
    let packed = ReduceDescriptor::contiguous(&request, &[4096, 256]);
    let mut strided = packed.clone();
    strided.output.strides[0] = 2;

    assert!(instance(&catalog, 2).is_supported(&packed));
    assert!(!instance(&catalog, 2).is_supported(&strided));
}

#[test]
fn test_alignment_limits_vector_width() {
    let (catalog, mut desc) = row_catalog(ReduceOperator::Add);
    desc.input = desc.input.with_alignment(8);

    assert!(!instance(&catalog, 3).is_supported(&desc));
    assert!(instance(&catalog, 5).is_supported(&desc));
}

#[test]
fn test_invalid_descriptor() {
    let (catalog, _) = row_catalog(ReduceOperator::Add);
    let desc = ReduceDescriptor::new(TensorDescriptor::contiguous(&[256, 4096, 2]), TensorDescriptor::contiguous(&[256]));

    assert!(matches!(instance(&catalog, 3).layout(&desc), Err(Error::InvalidDescriptor { .. })));
    assert!(!instance(&catalog, 3).is_supported(&desc));
}

#[test_case(ReduceOperator::Add, 0.0)]
#[test_case(ReduceOperator::Avg, 0.0)]
#[test_case(ReduceOperator::Norm1, 0.0)]
#[test_case(ReduceOperator::Mul, 1.0)]
fn test_output_init_value(operator: ReduceOperator, expected: f64) {
    let (catalog, _) = row_catalog(operator);
    assert_eq!(instance(&catalog, 0).output_init_value(), expected);
}

#[test]
fn test_no_workspace() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let layout = instance(&catalog, 3).layout(&desc).unwrap();
    assert_eq!(instance(&catalog, 3).workspace_bytes(&layout), 0);
}

#[test]
fn test_launch_records_params() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let kernel = RecordingKernel::default();
    let buffers = buffers().with_alpha(0.5);

    let handle = instance(&catalog, 3).launch(&desc, &buffers, &kernel).unwrap();
    assert_eq!(handle, LaunchHandle { id: 0 });

    let launches = kernel.launches();
    assert_eq!(launches.len(), 1);
    let params = &launches[0];
    assert_eq!(params.name, instance(&catalog, 3).type_string());
    assert_eq!(params.in_dtype, DType::Float32);
    assert_eq!(params.out_dtype, DType::Float32);
    assert_eq!(params.divisor, None);
    assert_eq!(params.invariant_total, 256);
    assert_eq!(params.reduce_total, 4096);
    assert_eq!(params.block_group_size, 128);
    assert_eq!(params.k_tile_iterations, 2);
    assert_eq!(params.grid_size, 256);
    assert_eq!(params.buffers, buffers);
    assert_eq!((params.tier1, params.tier2), instance(&catalog, 3).tiling());
}

#[test]
fn test_launch_avg_carries_divisor() {
    let (catalog, desc) = row_catalog(ReduceOperator::Avg);
    let kernel = RecordingKernel::default();

    instance(&catalog, 3).launch(&desc, &buffers(), &kernel).unwrap();

    let params = &kernel.launches()[0];
    assert_eq!(params.divisor, Some(4096));
    assert_eq!(params.traits.acc_elementwise, AccElementwise::Divide);
}

#[test]
fn test_launch_handles_increment() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let kernel = RecordingKernel::default();

    let first = instance(&catalog, 3).launch(&desc, &buffers(), &kernel).unwrap();
    let second = instance(&catalog, 5).launch(&desc, &buffers(), &kernel).unwrap();
    assert_ne!(first, second);
    assert_eq!(kernel.launches().len(), 2);
}

#[test]
fn test_launch_unsupported_argument() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let kernel = RecordingKernel::default();

    let err = instance(&catalog, 0).launch(&desc, &buffers(), &kernel).unwrap_err();
    assert!(matches!(err, Error::UnsupportedArgument { .. }), "{err}");
    assert!(kernel.launches().is_empty());
}

#[test]
fn test_launch_misaligned_input() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let kernel = RecordingKernel::default();
    let buffers = ReduceBuffers::new(DevicePtr(0x10004), DevicePtr(0x20000));

    let err = instance(&catalog, 3).launch(&desc, &buffers, &kernel).unwrap_err();
    assert!(matches!(err, Error::MisalignedBuffer { buffer: "input", address: 0x10004, alignment: 256 }), "{err}");
    assert!(kernel.launches().is_empty());
}

#[test]
fn test_launch_misaligned_output() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);
    let buffers = ReduceBuffers::new(DevicePtr(0x10000), DevicePtr(0x20010));

    let err = instance(&catalog, 3).launch(&desc, &buffers, &RecordingKernel::default()).unwrap_err();
    assert!(matches!(err, Error::MisalignedBuffer { buffer: "output", .. }), "{err}");
}

#[test]
fn test_launch_kernel_failure() {
    let (catalog, desc) = row_catalog(ReduceOperator::Add);

    let err = instance(&catalog, 3).launch(&desc, &buffers(), &FailingKernel).unwrap_err();
    assert!(matches!(err, Error::Launch { .. }), "{err}");
}
