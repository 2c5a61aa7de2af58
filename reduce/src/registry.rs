//! Process-wide catalog registry.
//!
//! Maps (request, tables) signatures to built catalogs. A catalog is built at
//! most once per signature and never replaced, so callers may hold on to the
//! returned `Arc` and share it across threads.
//!
//! # Thread Safety
//!
//! Lookups take a read lock. A miss takes the write lock and checks again
//! before building, so concurrent first requests for one signature build it
//! once. Builds of distinct signatures do not share any mutable state beyond
//! the map itself, but the write lock is held during a build, so first builds
//! of distinct signatures run one after another. A build only enumerates the
//! static tables and never touches the device.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::catalog::Catalog;
use crate::config::CatalogConfig;
use crate::config_space::TableSet;
use crate::error::Result;
use crate::request::ReduceRequest;

/// Cache key: request signature and the tables it was enumerated over.
type CatalogKey = (ReduceRequest, TableSet);

#[derive(Debug, Default)]
pub struct CatalogRegistry {
    catalogs: RwLock<HashMap<CatalogKey, Arc<Catalog>>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the catalog for `request`, building it on first use.
    ///
    /// Empty catalogs are cached like any other. Contract violations are
    /// returned and leave the registry unchanged.
    pub fn get_or_build(&self, request: &ReduceRequest, tables: TableSet) -> Result<Arc<Catalog>> {
        let key = (request.clone(), tables);

        // Fast path: read lock to check cache
        if let Some(catalog) = self.catalogs.read().get(&key) {
            return Ok(Arc::clone(catalog));
        }

        // Slow path: write lock to build
        let mut catalogs = self.catalogs.write();
        if let Some(catalog) = catalogs.get(&key) {
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(Catalog::build(request, tables)?);
        tracing::debug!(request = %request, %tables, instances = catalog.len(), "catalog registered");
        catalogs.insert(key, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Cached catalog, without building.
    pub fn get(&self, request: &ReduceRequest, tables: TableSet) -> Option<Arc<Catalog>> {
        self.catalogs.read().get(&(request.clone(), tables)).cloned()
    }

    /// Number of registered signatures.
    pub fn len(&self) -> usize {
        self.catalogs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.read().is_empty()
    }
}

/// Global catalog registry, lazily initialized on first access.
pub static CATALOGS: Lazy<CatalogRegistry> = Lazy::new(CatalogRegistry::new);

/// Catalog of `request` from the global registry, over the tables chosen by
/// [`CatalogConfig::global`].
pub fn global_catalog(request: &ReduceRequest) -> Result<Arc<Catalog>> {
    CATALOGS.get_or_build(request, CatalogConfig::global().tables)
}
