//! Hierarchy inference through equivalences and bulk hierarchy loading

mod helpers;

use compath_common::db::mappings::{count_mappings, get_or_create_mapping, get_mappings_by_type};
use compath_common::hierarchy::{infer_hierarchy, load_hierarchies, Relation};
use compath_common::{MappingType, PathwayReference};
use helpers::*;

#[tokio::test]
async fn test_parent_is_inferred_through_equivalence() {
    let store = setup().await;
    let u = user(&store.pool, "curator@example.org").await;

    let p1 = PathwayReference::new("kegg", "hsa00010", "P1");
    let p2 = PathwayReference::new("reactome", "R-HSA-2", "P2");
    let p3 = PathwayReference::new("reactome", "R-HSA-3", "P3");

    get_or_create_mapping(&store.pool, &store.registry, p1.clone(), p2.clone(), MappingType::EquivalentTo, u)
        .await
        .unwrap();
    get_or_create_mapping(&store.pool, &store.registry, p2.clone(), p3.clone(), MappingType::IsPartOf, u)
        .await
        .unwrap();

    let before = count_mappings(&store.pool).await.unwrap();
    let inferred = infer_hierarchy(&store.pool, &p1).await.unwrap();

    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].pathway, p3);
    assert_eq!(inferred[0].relation, Relation::Parent);
    assert_eq!(inferred[0].via, p2);
    assert_eq!(count_mappings(&store.pool).await.unwrap(), before, "inference never writes");
}

#[tokio::test]
async fn test_children_are_inferred_and_not_deduplicated() {
    let store = setup().await;
    let u = user(&store.pool, "curator@example.org").await;

    // kegg glycolysis is equivalent to both reactome and wikipathways glycolysis,
    // and both of those are parents of the same child
    let child = PathwayReference::new("reactome", "R-HSA-9", "Child");
    for (equivalent, mapping_type) in [
        (reactome_glycolysis(), MappingType::EquivalentTo),
        (wikipathways_glycolysis(), MappingType::EquivalentTo),
    ] {
        get_or_create_mapping(&store.pool, &store.registry, kegg_glycolysis(), equivalent.clone(), mapping_type, u)
            .await
            .unwrap();
        get_or_create_mapping(&store.pool, &store.registry, child.clone(), equivalent, MappingType::IsPartOf, u)
            .await
            .unwrap();
    }

    let inferred = infer_hierarchy(&store.pool, &kegg_glycolysis()).await.unwrap();
    assert_eq!(inferred.len(), 2);
    assert!(inferred
        .iter()
        .all(|h| h.pathway == child && h.relation == Relation::Child));
    assert_ne!(inferred[0].via, inferred[1].via);
}

#[tokio::test]
async fn test_pathway_without_equivalences_infers_nothing() {
    let store = setup().await;
    let u = user(&store.pool, "curator@example.org").await;

    get_or_create_mapping(
        &store.pool,
        &store.registry,
        reactome_glycolysis(),
        reactome_carbohydrates(),
        MappingType::IsPartOf,
        u,
    )
    .await
    .unwrap();

    // Direct hierarchy of the pathway itself is not an inference
    assert!(infer_hierarchy(&store.pool, &reactome_glycolysis())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_load_hierarchies_from_native_trees() {
    let store = setup().await;
    let curator = user(&store.pool, "curator@example.org").await;

    let report = load_hierarchies(&store.pool, &store.registry, curator)
        .await
        .unwrap();

    // Only reactome has a hierarchy, and only its human pathways are walked
    assert_eq!(report.resources, vec!["reactome".to_string()]);
    assert_eq!(report.pathways_visited, 4);
    assert_eq!(report.mappings_created, 2);

    let mappings = get_mappings_by_type(&store.pool, MappingType::IsPartOf)
        .await
        .unwrap();
    assert_eq!(mappings.len(), 2);
    assert!(mappings.iter().all(|m| !m.accepted));
    assert!(mappings
        .iter()
        .any(|m| m.side_1 == reactome_glycolysis() && m.side_2 == reactome_carbohydrates()));
    assert!(mappings
        .iter()
        .any(|m| m.side_1 == reactome_carbohydrates() && m.side_2 == reactome_metabolism()));

    let again = load_hierarchies(&store.pool, &store.registry, curator)
        .await
        .unwrap();
    assert_eq!(again.mappings_created, 0);
    assert_eq!(again.mappings_existing, 2);
    assert_eq!(count_mappings(&store.pool).await.unwrap(), 2);
}
