use crate::test::helpers::*;
use crate::*;

fn select_index(request: &ReduceRequest, desc: &ReduceDescriptor) -> Result<usize> {
    let catalog = Catalog::build(request, TableSet::Full)?;
    catalog.select(desc).map(|selection| selection.index)
}

#[test]
fn test_select_row_reduce() {
    let request = float_request(ReduceOperator::Add, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &[256, 4096]);
    let catalog = Catalog::build(&request, TableSet::Full).unwrap();

    let selection = catalog.select(&desc).unwrap();
    assert_eq!(selection.index, 3);
    assert_eq!(selection.layout.block_group_size, 128);
    assert_eq!(selection.layout.k_tile_iterations, 2);
    assert_eq!(selection.layout, selection.instance.layout(&desc).unwrap());
}

#[test]
fn test_select_column_reduce() {
    let request = float_request(ReduceOperator::Add, 2, &[0]);
    let desc = ReduceDescriptor::contiguous(&request, &[4096, 256]);
    let catalog = Catalog::build(&request, TableSet::Full).unwrap();

    let selection = catalog.select(&desc).unwrap();
    assert_eq!(selection.index, 2);
    assert_eq!(selection.layout.m_tile, 256);
    assert_eq!(selection.layout.k_tile, 2);
    assert_eq!(selection.layout.k_tile_iterations, 16);
    assert_eq!(selection.layout.grid_size, 128);
}

#[test]
fn test_select_full_reduction() {
    let request = float_request(ReduceOperator::Add, 1, &[0]);
    let desc = ReduceDescriptor::contiguous(&request, &[1_000_000]);
    assert_eq!(select_index(&request, &desc).unwrap(), 73);
}

#[test]
fn test_select_falls_back_on_low_alignment() {
    let request = float_request(ReduceOperator::Add, 2, &[1]);
    let mut desc = ReduceDescriptor::contiguous(&request, &[256, 4096]);
    desc.input = desc.input.with_alignment(8);
    assert_eq!(select_index(&request, &desc).unwrap(), 5);
}

#[test]
fn test_select_is_first_match() {
    let request = float_request(ReduceOperator::Add, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &[256, 4096]);
    let catalog = Catalog::build(&request, TableSet::Full).unwrap();

    let selection = catalog.select(&desc).unwrap();
    assert!(catalog.iter().take(selection.index).all(|instance| !instance.is_supported(&desc)));
}

#[test]
fn test_select_no_applicable_instance() {
    let request = float_request(ReduceOperator::Add, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &[256, 64]);

    let err = select_index(&request, &desc).unwrap_err();
    assert!(matches!(err, Error::NoApplicableInstance { candidates: 84 }), "{err}");
}

#[test]
fn test_select_on_empty_catalog() {
    let request = float_request(ReduceOperator::Max, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &[256, 4096]);

    let err = select_index(&request, &desc).unwrap_err();
    assert!(matches!(err, Error::NoApplicableInstance { candidates: 0 }), "{err}");
}

#[test]
fn test_select_skips_mismatched_descriptor() {
    let request = float_request(ReduceOperator::Add, 2, &[1]);
    let desc = ReduceDescriptor::contiguous(&request, &[256, 4096, 2]);
    assert!(matches!(select_index(&request, &desc), Err(Error::NoApplicableInstance { .. })));
}

#[test]
fn test_from_instances_concatenates_families() {
    let request = scenario_a();
    let mut instances = Vec::new();
    add_multiblock_atomic_add_instances(&request, TableSet::Quick, &mut instances).unwrap();
    add_multiblock_atomic_add_instances(&request, TableSet::Full, &mut instances).unwrap();

    let catalog = Catalog::from_instances(instances);
    assert_eq!(catalog.len(), TableSet::Quick.combinations() + TableSet::Full.combinations());
    assert_eq!((&catalog).into_iter().count(), catalog.len());
    assert!(catalog.get(catalog.len()).is_none());
}

#[test]
fn test_select_rejects_overflowing_descriptor() {
    let request = float_request(ReduceOperator::Add, 3, &[1, 2]);
    let desc = ReduceDescriptor::contiguous(&request, &[1, 1 << 33, 1 << 33]);

    let err = select_index(&request, &desc).unwrap_err();
    assert!(matches!(err, Error::NoApplicableInstance { candidates: 84 }), "{err}");
}
