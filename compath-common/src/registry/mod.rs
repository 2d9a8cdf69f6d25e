//! Resource registry
//!
//! Every external pathway database is reached through [`ResourceProvider`].
//! Providers are composed into a [`ResourceRegistry`] once at startup and
//! passed by reference into the mapping, hierarchy and curation operations.
//! The registry is read-only: the core never writes to a resource.

mod catalog;

pub use catalog::{CatalogEntry, CatalogResource};

use crate::config::ResourceConfig;
use crate::model::PathwayReference;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Uniform view of a pathway held by an external resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathwayRecord {
    pub identifier: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    /// Direct children, resolved one level deep
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PathwayRecord>,
}

impl PathwayRecord {
    /// Reference to this pathway inside `resource`
    pub fn reference(&self, resource: &str) -> PathwayReference {
        PathwayReference::new(resource, self.identifier.clone(), self.name.clone())
    }
}

/// Capability interface of one pathway resource
pub trait ResourceProvider: Send + Sync {
    /// Registry key, e.g. `kegg`
    fn name(&self) -> &str;

    /// Exact-name lookup
    fn get_pathway_by_name(&self, name: &str) -> Option<PathwayRecord>;

    /// Identifier lookup
    fn get_pathway_by_id(&self, identifier: &str) -> Option<PathwayRecord>;

    /// Every pathway this resource exposes for hierarchy loading
    fn list_all(&self) -> Vec<PathwayRecord>;

    /// Whether the resource carries a native parent/child structure
    fn has_hierarchy(&self) -> bool;
}

/// Resource summary returned by the web API
#[derive(Debug, Clone, Serialize)]
pub struct ResourceInfo {
    pub name: String,
    pub styled_name: String,
    pub has_hierarchy: bool,
}

/// Named set of resource providers
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    providers: BTreeMap<String, Arc<dyn ResourceProvider>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from `[[resources]]` configuration entries
    pub fn from_config(resources: &[ResourceConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for resource in resources {
            let provider = CatalogResource::load(resource)?;
            info!(
                "Registered resource '{}' ({} pathways, hierarchy: {})",
                resource.name,
                provider.len(),
                resource.has_hierarchy
            );
            registry.register(Arc::new(provider));
        }
        Ok(registry)
    }

    /// Add or replace a provider under its own name
    pub fn register(&mut self, provider: Arc<dyn ResourceProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.providers.contains_key(resource)
    }

    /// Registered resource names in lexicographic order
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn ResourceProvider>> {
        self.providers.values()
    }

    pub fn resources(&self) -> Vec<ResourceInfo> {
        self.providers
            .values()
            .map(|provider| ResourceInfo {
                name: provider.name().to_string(),
                styled_name: crate::model::styled_name(provider.name()).to_string(),
                has_hierarchy: provider.has_hierarchy(),
            })
            .collect()
    }

    pub fn get(&self, resource: &str) -> Result<&Arc<dyn ResourceProvider>> {
        self.providers
            .get(resource)
            .ok_or_else(|| Error::UnknownResource(resource.to_string()))
    }

    pub fn ensure_registered(&self, resource: &str) -> Result<()> {
        self.get(resource).map(|_| ())
    }

    pub fn get_pathway_by_name(&self, resource: &str, name: &str) -> Result<Option<PathwayRecord>> {
        Ok(self.get(resource)?.get_pathway_by_name(name))
    }

    pub fn get_pathway_by_id(&self, resource: &str, identifier: &str) -> Result<Option<PathwayRecord>> {
        Ok(self.get(resource)?.get_pathway_by_id(identifier))
    }

    /// Resolve a pathway name to a full reference, failing when it is unknown
    pub fn resolve_by_name(&self, resource: &str, name: &str) -> Result<PathwayReference> {
        self.get_pathway_by_name(resource, name)?
            .map(|record| record.reference(resource))
            .ok_or_else(|| Error::PathwayNotFound {
                resource: resource.to_string(),
                pathway: name.to_string(),
            })
    }

    /// Resolve a pathway identifier to a full reference, failing when it is unknown
    pub fn resolve_by_id(&self, resource: &str, identifier: &str) -> Result<PathwayReference> {
        self.get_pathway_by_id(resource, identifier)?
            .map(|record| record.reference(resource))
            .ok_or_else(|| Error::PathwayNotFound {
                resource: resource.to_string(),
                pathway: identifier.to_string(),
            })
    }
}
