//! JSON catalog backed resource provider
//!
//! A catalog is a JSON array of pathways:
//!
//! ```json
//! [
//!   {"identifier": "R-HSA-1430728", "name": "Metabolism", "species": "Homo sapiens",
//!    "children": ["R-HSA-70171"]},
//!   {"identifier": "R-HSA-70171", "name": "Glycolysis", "species": "Homo sapiens"}
//! ]
//! ```
//!
//! Children are listed by identifier and resolved on lookup.

use super::{PathwayRecord, ResourceProvider};
use crate::config::ResourceConfig;
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// One pathway as stored in a catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl CatalogEntry {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            species: None,
            children: Vec::new(),
        }
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }
}

/// In-memory resource loaded from a catalog
pub struct CatalogResource {
    name: String,
    has_hierarchy: bool,
    /// Only pathways of this species are listed for hierarchy loading
    species: Option<String>,
    entries: Vec<CatalogEntry>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl CatalogResource {
    pub fn from_entries(
        name: impl Into<String>,
        entries: Vec<CatalogEntry>,
        has_hierarchy: bool,
        species: Option<String>,
    ) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_id.entry(entry.identifier.clone()).or_insert(index);
            by_name.entry(entry.name.clone()).or_insert(index);
        }

        Self {
            name: name.into(),
            has_hierarchy,
            species,
            entries,
            by_id,
            by_name,
        }
    }

    /// Load the catalog named in the configuration
    ///
    /// A resource without a catalog file is registered empty so that mappings
    /// naming it still pass the registry check.
    pub fn load(config: &ResourceConfig) -> Result<Self> {
        let entries = match &config.catalog {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str::<Vec<CatalogEntry>>(&content)?
            }
            Some(path) => {
                warn!(
                    "Catalog for resource '{}' not found at {}; registering it empty",
                    config.name,
                    path.display()
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(Self::from_entries(
            config.name.clone(),
            entries,
            config.has_hierarchy,
            config.species.clone(),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record(&self, index: usize) -> PathwayRecord {
        let entry = &self.entries[index];
        let children = entry
            .children
            .iter()
            .filter_map(|child_id| self.by_id.get(child_id))
            .map(|&child| {
                let child = &self.entries[child];
                PathwayRecord {
                    identifier: child.identifier.clone(),
                    name: child.name.clone(),
                    species: child.species.clone(),
                    children: Vec::new(),
                }
            })
            .collect();

        PathwayRecord {
            identifier: entry.identifier.clone(),
            name: entry.name.clone(),
            species: entry.species.clone(),
            children,
        }
    }
}

impl ResourceProvider for CatalogResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_pathway_by_name(&self, name: &str) -> Option<PathwayRecord> {
        self.by_name.get(name).map(|&index| self.record(index))
    }

    fn get_pathway_by_id(&self, identifier: &str) -> Option<PathwayRecord> {
        self.by_id.get(identifier).map(|&index| self.record(index))
    }

    fn list_all(&self) -> Vec<PathwayRecord> {
        (0..self.entries.len())
            .filter(|&index| match &self.species {
                Some(species) => self.entries[index].species.as_deref() == Some(species.as_str()),
                None => true,
            })
            .map(|index| self.record(index))
            .collect()
    }

    fn has_hierarchy(&self) -> bool {
        self.has_hierarchy
    }
}
