//! Hierarchy inference and bulk loading of resource-native hierarchies
//!
//! Inference carries a hierarchy across an equivalence: when `P` is
//! equivalent to `P'` and `P'` takes part in an `isPartOf` mapping, the other
//! side of that mapping is suggested as a relative of `P`. Nothing is written.

use crate::db::mappings::{get_mappings_by_pathway_and_type, get_or_create_mapping};
use crate::model::{MappingType, PathwayReference};
use crate::registry::ResourceRegistry;
use crate::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

/// Position of the suggested pathway relative to the queried one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Parent,
    Child,
}

/// A hierarchical relationship suggested through an equivalent pathway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredHierarchy {
    /// The suggested relative
    pub pathway: PathwayReference,
    pub relation: Relation,
    /// The equivalent pathway the hierarchy was found on
    pub via: PathwayReference,
    /// The `isPartOf` mapping the suggestion comes from
    pub mapping_id: i64,
}

/// Suggest parents and children of `pathway` through its equivalences
///
/// Suggestions reached through several equivalence paths are reported once
/// per path.
pub async fn infer_hierarchy(
    pool: &SqlitePool,
    pathway: &PathwayReference,
) -> Result<Vec<InferredHierarchy>> {
    let mut inferred = Vec::new();

    let equivalences =
        get_mappings_by_pathway_and_type(pool, pathway, MappingType::EquivalentTo).await?;

    for equivalence in &equivalences {
        let Some(equivalent) = equivalence.complement(pathway) else {
            continue;
        };

        let hierarchies =
            get_mappings_by_pathway_and_type(pool, equivalent, MappingType::IsPartOf).await?;

        for hierarchy in hierarchies {
            // side_1 is part of side_2
            let (relative, relation) = if &hierarchy.side_1 == equivalent {
                (hierarchy.side_2.clone(), Relation::Parent)
            } else {
                (hierarchy.side_1.clone(), Relation::Child)
            };

            inferred.push(InferredHierarchy {
                pathway: relative,
                relation,
                via: equivalent.clone(),
                mapping_id: hierarchy.id,
            });
        }
    }

    Ok(inferred)
}

/// Outcome of [`load_hierarchies`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct HierarchyLoadReport {
    pub resources: Vec<String>,
    pub pathways_visited: usize,
    pub mappings_created: usize,
    pub mappings_existing: usize,
}

/// Seed `isPartOf` mappings from every resource that has a native hierarchy
///
/// Each `child isPartOf parent` edge is proposed by `curator_id`; the
/// mappings are not accepted.
pub async fn load_hierarchies(
    pool: &SqlitePool,
    registry: &ResourceRegistry,
    curator_id: i64,
) -> Result<HierarchyLoadReport> {
    let mut report = HierarchyLoadReport::default();

    for provider in registry.providers() {
        if !provider.has_hierarchy() {
            continue;
        }

        let resource = provider.name();
        let pathways = provider.list_all();
        info!(
            "Searching for hierarchical relationships in {} {} pathways",
            pathways.len(),
            resource
        );

        let mut created_here = 0;
        for parent in &pathways {
            report.pathways_visited += 1;

            for child in &parent.children {
                let (_, created) = get_or_create_mapping(
                    pool,
                    registry,
                    child.reference(resource),
                    parent.reference(resource),
                    MappingType::IsPartOf,
                    curator_id,
                )
                .await?;

                if created {
                    created_here += 1;
                } else {
                    report.mappings_existing += 1;
                }
            }
        }

        info!("{} hierarchical mappings created in {}", created_here, resource);
        report.mappings_created += created_here;
        report.resources.push(resource.to_string());
    }

    Ok(report)
}
