//! Shared fixtures for the compath-common integration tests
#![allow(dead_code)]

use compath_common::db::init::init_database;
use compath_common::db::users::make_user;
use compath_common::registry::{CatalogEntry, CatalogResource, ResourceRegistry};
use compath_common::PathwayReference;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// A fresh database in a temporary directory plus the test registry
pub struct TestStore {
    pub pool: SqlitePool,
    pub registry: ResourceRegistry,
    // Keeps the database directory alive for the duration of the test
    _dir: TempDir,
}

pub async fn setup() -> TestStore {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("compath.db")).await.unwrap();
    TestStore {
        pool,
        registry: test_registry(),
        _dir: dir,
    }
}

/// kegg and wikipathways are flat; reactome carries a human and a mouse tree
pub fn test_registry() -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();

    registry.register(Arc::new(CatalogResource::from_entries(
        "kegg",
        vec![
            CatalogEntry::new("hsa00010", "Glycolysis / Gluconeogenesis"),
            CatalogEntry::new("hsa04210", "Apoptosis"),
            CatalogEntry::new("hsa00020", "Citrate cycle (TCA cycle)"),
        ],
        false,
        None,
    )));

    registry.register(Arc::new(CatalogResource::from_entries(
        "reactome",
        vec![
            CatalogEntry::new("R-HSA-1430728", "Metabolism")
                .with_species("Homo sapiens")
                .with_children(["R-HSA-71387"]),
            CatalogEntry::new("R-HSA-71387", "Metabolism of carbohydrates")
                .with_species("Homo sapiens")
                .with_children(["R-HSA-70171"]),
            CatalogEntry::new("R-HSA-70171", "Glycolysis").with_species("Homo sapiens"),
            CatalogEntry::new("R-HSA-109581", "Apoptosis").with_species("Homo sapiens"),
            CatalogEntry::new("R-MMU-1430728", "Metabolism")
                .with_species("Mus musculus")
                .with_children(["R-MMU-70171"]),
            CatalogEntry::new("R-MMU-70171", "Glycolysis").with_species("Mus musculus"),
        ],
        true,
        Some("Homo sapiens".to_string()),
    )));

    registry.register(Arc::new(CatalogResource::from_entries(
        "wikipathways",
        vec![
            CatalogEntry::new("WP534", "Glycolysis and Gluconeogenesis"),
            CatalogEntry::new("WP254", "Apoptosis"),
        ],
        false,
        None,
    )));

    registry
}

/// Create a confirmed user and return its id
pub async fn user(pool: &SqlitePool, email: &str) -> i64 {
    make_user(pool, email, "secret").await.unwrap().0.id
}

pub fn kegg_glycolysis() -> PathwayReference {
    PathwayReference::new("kegg", "hsa00010", "Glycolysis / Gluconeogenesis")
}

pub fn kegg_apoptosis() -> PathwayReference {
    PathwayReference::new("kegg", "hsa04210", "Apoptosis")
}

pub fn reactome_glycolysis() -> PathwayReference {
    PathwayReference::new("reactome", "R-HSA-70171", "Glycolysis")
}

pub fn reactome_carbohydrates() -> PathwayReference {
    PathwayReference::new("reactome", "R-HSA-71387", "Metabolism of carbohydrates")
}

pub fn reactome_metabolism() -> PathwayReference {
    PathwayReference::new("reactome", "R-HSA-1430728", "Metabolism")
}

pub fn reactome_apoptosis() -> PathwayReference {
    PathwayReference::new("reactome", "R-HSA-109581", "Apoptosis")
}

pub fn wikipathways_glycolysis() -> PathwayReference {
    PathwayReference::new("wikipathways", "WP534", "Glycolysis and Gluconeogenesis")
}
