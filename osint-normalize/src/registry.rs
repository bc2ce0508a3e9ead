//! Vendor registry
//!
//! Immutable after construction. The built-in registry is created once on
//! first use from [`BUILTIN_ADAPTERS`].

use std::collections::BTreeSet;
use std::sync::LazyLock;

use indexmap::IndexMap;

use osint_core::{OsintError, OsintResult, QueryType, VendorId};

use crate::adapter::VendorAdapter;
use crate::catalogue::BUILTIN_ADAPTERS;

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| Registry::new(BUILTIN_ADAPTERS));

/// Lookup table from vendor id to adapter
#[derive(Debug, Clone)]
pub struct Registry {
    adapters: IndexMap<VendorId, VendorAdapter>,
}

impl Registry {
    /// Build a registry; a later adapter for the same vendor replaces the
    /// earlier one but keeps its position
    pub fn new(adapters: impl IntoIterator<Item = VendorAdapter>) -> Self {
        let mut map = IndexMap::new();
        for adapter in adapters {
            map.insert(adapter.id, adapter);
        }
        Self { adapters: map }
    }

    /// The registry of every built-in vendor
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn get(&self, vendor: VendorId) -> OsintResult<&VendorAdapter> {
        self.adapters.get(&vendor).ok_or_else(|| {
            OsintError::config(format!("Vendor {} is not registered", vendor.as_str()))
        })
    }

    /// Look up by identifier string (`"snusbase"`, `"Leak-Lookup"`, ...)
    pub fn lookup(&self, name: &str) -> OsintResult<&VendorAdapter> {
        let vendor: VendorId = name.parse()?;
        self.get(vendor)
    }

    pub fn supported_query_types(&self, vendor: VendorId) -> OsintResult<BTreeSet<QueryType>> {
        Ok(self.get(vendor)?.query_types.iter().copied().collect())
    }

    /// All registered vendors, in registration order
    pub fn all_vendors(&self) -> Vec<VendorId> {
        self.adapters.keys().copied().collect()
    }

    /// Registered vendors that accept `query_type`
    pub fn vendors_for(&self, query_type: QueryType) -> Vec<VendorId> {
        self.adapters
            .values()
            .filter(|a| a.supports(query_type))
            .map(|a| a.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
