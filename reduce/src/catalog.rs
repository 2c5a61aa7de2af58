//! Ordered instance catalogs and first-match selection.

use std::sync::Arc;

use crate::config_space::TableSet;
use crate::descriptor::ReduceDescriptor;
use crate::error::{NoApplicableInstanceSnafu, Result};
use crate::factory::add_multiblock_atomic_add_instances;
use crate::instance::{DeviceReduce, ReduceLayout};
use crate::request::ReduceRequest;

/// Immutable, ordered list of instances for one request.
///
/// Order matters: [`Catalog::select`] returns the first instance whose
/// capability check passes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    instances: Vec<Arc<dyn DeviceReduce>>,
}

/// Instance picked for a concrete descriptor.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// Position in the catalog.
    pub index: usize,
    pub instance: &'a Arc<dyn DeviceReduce>,
    pub layout: ReduceLayout,
}

impl Catalog {
    /// Build the atomic-add catalog of `request` over `tables`.
    ///
    /// An empty catalog means the strategy does not apply.
    pub fn build(request: &ReduceRequest, tables: TableSet) -> Result<Self> {
        let mut instances = Vec::new();
        add_multiblock_atomic_add_instances(request, tables, &mut instances)?;
        Ok(Self::from_instances(instances))
    }

    /// Freeze instances gathered from one or more factories.
    pub fn from_instances(instances: Vec<Arc<dyn DeviceReduce>>) -> Self {
        Self { instances }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn DeviceReduce>> {
        self.instances.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DeviceReduce>> {
        self.instances.iter()
    }

    /// First instance supporting `desc`, in catalog order.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NoApplicableInstance`] if no instance accepts `desc`,
    /// including when the catalog is empty.
    pub fn select(&self, desc: &ReduceDescriptor) -> Result<Selection<'_>> {
        for (index, instance) in self.instances.iter().enumerate() {
            let Ok(layout) = instance.layout(desc) else { continue };
            if instance.supports_layout(desc, &layout) {
                tracing::trace!(index, instance = %instance.type_string(), "instance selected");
                return Ok(Selection { index, instance, layout });
            }
        }
        NoApplicableInstanceSnafu { candidates: self.instances.len() }.fail()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Arc<dyn DeviceReduce>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn DeviceReduce>>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
