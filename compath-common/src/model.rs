//! Pathway references, mapping types and the canonical side ordering

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum number of up-votes for a mapping to be accepted
pub const VOTE_ACCEPTANCE: i64 = 3;

/// Curator account used when no curator emails are configured
pub const ADMIN_EMAIL: &str = "daniel.domingo.fernandez@scai.fraunhofer.de";

/// Keyword of the symmetric relationship
pub const EQUIVALENT_TO: &str = "equivalentTo";

/// Keyword of the hierarchical relationship
pub const IS_PART_OF: &str = "isPartOf";

/// Display names of the known pathway resources
pub const STYLED_NAMES: &[(&str, &str)] = &[
    ("kegg", "KEGG"),
    ("reactome", "Reactome"),
    ("wikipathways", "WikiPathways"),
    ("msig", "MSigDB"),
    ("pid.pathways", "Pathway Interaction Database"),
    ("compath_neurommsig_ad", "NeuroMMSig AD"),
    ("compath_neurommsig_pd", "NeuroMMSig PD"),
];

/// Styled name for a resource, falling back to the registry key
pub fn styled_name(resource: &str) -> &str {
    STYLED_NAMES
        .iter()
        .find(|(key, _)| *key == resource)
        .map(|(_, styled)| *styled)
        .unwrap_or(resource)
}

/// A pathway inside one resource's namespace
///
/// Equality compares all three fields, case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathwayReference {
    pub resource: String,
    pub pathway_id: String,
    pub pathway_name: String,
}

impl PathwayReference {
    pub fn new(
        resource: impl Into<String>,
        pathway_id: impl Into<String>,
        pathway_name: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            pathway_id: pathway_id.into(),
            pathway_name: pathway_name.into(),
        }
    }
}

impl fmt::Display for PathwayReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.resource, self.pathway_id, self.pathway_name)
    }
}

/// Relationship asserted by a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingType {
    /// Symmetric: both sides describe the same biological concept
    #[serde(rename = "equivalentTo")]
    EquivalentTo,
    /// Directed: side 1 is part of side 2
    #[serde(rename = "isPartOf")]
    IsPartOf,
}

impl MappingType {
    pub const ALL: [MappingType; 2] = [MappingType::EquivalentTo, MappingType::IsPartOf];

    /// Keyword used in storage, exports and curation statements
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingType::EquivalentTo => EQUIVALENT_TO,
            MappingType::IsPartOf => IS_PART_OF,
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            EQUIVALENT_TO | "EQUIVALENT_TO" => Ok(MappingType::EquivalentTo),
            IS_PART_OF | "IS_PART_OF" => Ok(MappingType::IsPartOf),
            other => Err(Error::InvalidMappingType(other.to_string())),
        }
    }
}

/// Whether two equivalence sides must be swapped to reach canonical order
///
/// Same-resource pairs are never flipped; their order stays as given.
pub fn should_flip(resource_1: &str, resource_2: &str) -> bool {
    if resource_1 == resource_2 {
        return false;
    }
    resource_1 > resource_2
}

/// Canonical storage order of a candidate pair
///
/// `isPartOf` pairs are directed and returned untouched.
pub fn canonical_order(
    side_1: PathwayReference,
    side_2: PathwayReference,
    mapping_type: MappingType,
) -> (PathwayReference, PathwayReference) {
    match mapping_type {
        MappingType::EquivalentTo if should_flip(&side_1.resource, &side_2.resource) => {
            (side_2, side_1)
        }
        _ => (side_1, side_2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kegg() -> PathwayReference {
        PathwayReference::new("kegg", "hsa00010", "Glycolysis")
    }

    fn reactome() -> PathwayReference {
        PathwayReference::new("reactome", "R-HSA-70171", "Glycolysis")
    }

    #[test]
    fn test_flip_rules() {
        assert!(!should_flip("kegg", "kegg"));
        assert!(!should_flip("kegg", "reactome"));
        assert!(should_flip("reactome", "kegg"));
    }

    #[test]
    fn test_equivalence_is_reordered() {
        let (first, second) = canonical_order(reactome(), kegg(), MappingType::EquivalentTo);
        assert_eq!(first, kegg());
        assert_eq!(second, reactome());
    }

    #[test]
    fn test_part_of_keeps_direction() {
        let (first, second) = canonical_order(reactome(), kegg(), MappingType::IsPartOf);
        assert_eq!(first, reactome());
        assert_eq!(second, kegg());
    }

    #[test]
    fn test_same_resource_keeps_given_order() {
        let a = PathwayReference::new("reactome", "R-2", "B");
        let b = PathwayReference::new("reactome", "R-1", "A");
        let (first, second) = canonical_order(a.clone(), b.clone(), MappingType::EquivalentTo);
        assert_eq!(first, a);
        assert_eq!(second, b);
    }

    #[test]
    fn test_mapping_type_parsing() {
        assert_eq!("equivalentTo".parse::<MappingType>().unwrap(), MappingType::EquivalentTo);
        assert_eq!(" isPartOf ".parse::<MappingType>().unwrap(), MappingType::IsPartOf);
        assert_eq!("IS_PART_OF".parse::<MappingType>().unwrap(), MappingType::IsPartOf);
        assert!(matches!(
            "equivalentto".parse::<MappingType>(),
            Err(Error::InvalidMappingType(_))
        ));
    }

    #[test]
    fn test_styled_names() {
        assert_eq!(styled_name("kegg"), "KEGG");
        assert_eq!(styled_name("custom"), "custom");
    }
}
