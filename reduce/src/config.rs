//! Catalog configuration.
//!
//! Supports both explicit configuration through a bon builder and
//! environment variable fallbacks.

use bon::bon;
use once_cell::sync::Lazy;

use crate::config_space::TableSet;

/// Environment variable selecting the tiling tables (`full` or `quick`).
pub const TABLES_ENV: &str = "REDCAT_REDUCE_TABLES";

/// Configuration shared by catalog builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Tiling tables the factory enumerates.
    pub tables: TableSet,
}

impl CatalogConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `REDCAT_REDUCE_TABLES` - `full` (default) or `quick`
    pub fn from_env() -> Self {
        Self { tables: parse_tables(std::env::var(TABLES_ENV).ok().as_deref()) }
    }

    /// Process-wide configuration, read from the environment on first use.
    pub fn global() -> &'static Self {
        &GLOBAL_CONFIG
    }
}

#[bon]
impl CatalogConfig {
    /// Create a catalog configuration with builder pattern.
    #[builder]
    pub fn builder(#[builder(default)] tables: TableSet) -> Self {
        Self { tables }
    }
}

/// Table selection from a raw `REDCAT_REDUCE_TABLES` value. Unknown values
/// fall back to the full tables with a warning.
pub(crate) fn parse_tables(value: Option<&str>) -> TableSet {
    let Some(value) = value else { return TableSet::default() };
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(%value, "unknown {TABLES_ENV} value, using full tables");
        TableSet::Full
    })
}

static GLOBAL_CONFIG: Lazy<CatalogConfig> = Lazy::new(CatalogConfig::from_env);
