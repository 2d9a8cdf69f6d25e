//! Mapping store
//!
//! One row per canonical `(side_1, side_2, type)`. Re-proposals collapse onto
//! the existing row as additional creators and votes; the table's UNIQUE
//! constraint turns a lost insert race into a claim of the winner's row.

use crate::db::votes::{get_or_create_vote, tally, VoteTally};
use crate::model::{canonical_order, MappingType, PathwayReference};
use crate::registry::ResourceRegistry;
use crate::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

/// A stored relationship between two pathways
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub id: i64,
    pub side_1: PathwayReference,
    pub side_2: PathwayReference,
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    pub accepted: bool,
}

impl Mapping {
    /// Whether `pathway` is one of the two sides
    pub fn has_pathway(&self, pathway: &PathwayReference) -> bool {
        &self.side_1 == pathway || &self.side_2 == pathway
    }

    /// The side opposite to `pathway`, or `None` if it is on neither side
    pub fn complement(&self, pathway: &PathwayReference) -> Option<&PathwayReference> {
        if &self.side_1 == pathway {
            Some(&self.side_2)
        } else if &self.side_2 == pathway {
            Some(&self.side_1)
        } else {
            None
        }
    }
}

/// A mapping with its derived vote and creator counts
#[derive(Debug, Clone, Serialize)]
pub struct MappingSummary {
    #[serde(flatten)]
    pub mapping: Mapping,
    pub up_votes: i64,
    pub down_votes: i64,
    pub creators: Vec<String>,
}

impl MappingSummary {
    pub fn count_votes(&self) -> i64 {
        self.up_votes + self.down_votes
    }

    pub fn count_creators(&self) -> usize {
        self.creators.len()
    }

    pub fn is_acceptable(&self, quorum: i64) -> bool {
        self.up_votes >= quorum
    }
}

/// Optional restrictions for listing mappings
#[derive(Debug, Clone, Default)]
pub struct MappingFilter {
    pub accepted: Option<bool>,
    pub mapping_type: Option<MappingType>,
    /// Either side belongs to this resource
    pub resource: Option<String>,
}

impl MappingFilter {
    pub fn accepted_only() -> Self {
        Self {
            accepted: Some(true),
            ..Self::default()
        }
    }
}

pub(crate) fn mapping_from_row(row: &SqliteRow) -> Result<Mapping> {
    let mapping_type: String = row.get("type");
    Ok(Mapping {
        id: row.get("id"),
        side_1: PathwayReference {
            resource: row.get("service_1_name"),
            pathway_id: row.get("service_1_pathway_id"),
            pathway_name: row.get("service_1_pathway_name"),
        },
        side_2: PathwayReference {
            resource: row.get("service_2_name"),
            pathway_id: row.get("service_2_pathway_id"),
            pathway_name: row.get("service_2_pathway_name"),
        },
        mapping_type: mapping_type.parse()?,
        accepted: row.get("accepted"),
    })
}

fn mappings_from_rows(rows: &[SqliteRow]) -> Result<Vec<Mapping>> {
    rows.iter().map(mapping_from_row).collect()
}

/// A unique-constraint violation means another writer inserted the same pair first
fn race_or_database(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::DuplicateMappingRace
        }
        _ => Error::Database(e),
    }
}

pub async fn get_mapping_by_id(pool: &SqlitePool, mapping_id: i64) -> Result<Option<Mapping>> {
    let row = sqlx::query("SELECT * FROM mappings WHERE id = ?")
        .bind(mapping_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(mapping_from_row).transpose()
}

/// Exact lookup of an already canonical pair
pub async fn get_mapping(
    pool: &SqlitePool,
    side_1: &PathwayReference,
    side_2: &PathwayReference,
    mapping_type: MappingType,
) -> Result<Option<Mapping>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM mappings
        WHERE service_1_name = ? AND service_1_pathway_id = ? AND service_1_pathway_name = ?
          AND service_2_name = ? AND service_2_pathway_id = ? AND service_2_pathway_name = ?
          AND type = ?
        "#,
    )
    .bind(&side_1.resource)
    .bind(&side_1.pathway_id)
    .bind(&side_1.pathway_name)
    .bind(&side_2.resource)
    .bind(&side_2.pathway_id)
    .bind(&side_2.pathway_name)
    .bind(mapping_type.as_str())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(mapping_from_row).transpose()
}

/// What proposing a candidate pair did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Proposal {
    /// A new mapping was stored with the user as its first creator
    Created,
    /// The mapping existed and the user joined its creators
    Claimed,
    /// The user had already established this mapping
    AlreadyCreator,
}

impl Proposal {
    fn from_claim(claimed: bool) -> Self {
        if claimed {
            Proposal::Claimed
        } else {
            Proposal::AlreadyCreator
        }
    }
}

/// Get the mapping for a candidate pair, creating it when absent
///
/// Returns `(mapping, created)`. An existing mapping is claimed for `user_id`
/// instead of being duplicated.
pub async fn get_or_create_mapping(
    pool: &SqlitePool,
    registry: &ResourceRegistry,
    side_1: PathwayReference,
    side_2: PathwayReference,
    mapping_type: MappingType,
    user_id: i64,
) -> Result<(Mapping, bool)> {
    let (mapping, proposal) =
        propose_mapping(pool, registry, side_1, side_2, mapping_type, user_id).await?;
    Ok((mapping, proposal == Proposal::Created))
}

/// Like [`get_or_create_mapping`], but tells a fresh claim apart from a repeat
pub async fn propose_mapping(
    pool: &SqlitePool,
    registry: &ResourceRegistry,
    side_1: PathwayReference,
    side_2: PathwayReference,
    mapping_type: MappingType,
    user_id: i64,
) -> Result<(Mapping, Proposal)> {
    registry.ensure_registered(&side_1.resource)?;
    registry.ensure_registered(&side_2.resource)?;

    let (side_1, side_2) = canonical_order(side_1, side_2, mapping_type);

    if let Some(mapping) = get_mapping(pool, &side_1, &side_2, mapping_type).await? {
        let claimed = claim_mapping(pool, mapping.id, user_id).await?;
        return Ok((mapping, Proposal::from_claim(claimed)));
    }

    match insert_mapping(pool, &side_1, &side_2, mapping_type, user_id).await {
        Ok(mapping) => {
            debug!(
                "Created mapping {}: {} {} {}",
                mapping.id, mapping.side_1, mapping_type, mapping.side_2
            );
            Ok((mapping, Proposal::Created))
        }
        Err(Error::DuplicateMappingRace) => {
            warn!(
                "Concurrent insert of {} {} {}; claiming existing mapping",
                side_1, mapping_type, side_2
            );
            let mapping = get_mapping(pool, &side_1, &side_2, mapping_type)
                .await?
                .ok_or_else(|| {
                    Error::Internal(format!(
                        "mapping {} {} {} missing after unique violation",
                        side_1, mapping_type, side_2
                    ))
                })?;
            let claimed = claim_mapping(pool, mapping.id, user_id).await?;
            Ok((mapping, Proposal::from_claim(claimed)))
        }
        Err(e) => Err(e),
    }
}

/// Insert the mapping, its first creator and the creator's up-vote together
async fn insert_mapping(
    pool: &SqlitePool,
    side_1: &PathwayReference,
    side_2: &PathwayReference,
    mapping_type: MappingType,
    user_id: i64,
) -> Result<Mapping> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO mappings (
            service_1_name, service_1_pathway_id, service_1_pathway_name,
            service_2_name, service_2_pathway_id, service_2_pathway_name,
            type, accepted
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(&side_1.resource)
    .bind(&side_1.pathway_id)
    .bind(&side_1.pathway_name)
    .bind(&side_2.resource)
    .bind(&side_2.pathway_id)
    .bind(&side_2.pathway_name)
    .bind(mapping_type.as_str())
    .execute(&mut *tx)
    .await
    .map_err(race_or_database)?;

    let mapping_id = result.last_insert_rowid();

    sqlx::query("INSERT INTO mapping_creators (mapping_id, user_id) VALUES (?, ?)")
        .bind(mapping_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO votes (mapping_id, user_id, type, changed) VALUES (?, ?, 1, ?)")
        .bind(mapping_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Mapping {
        id: mapping_id,
        side_1: side_1.clone(),
        side_2: side_2.clone(),
        mapping_type,
        accepted: false,
    })
}

/// Add `user_id` to the creators of a mapping
///
/// Returns false when the user already was a creator. A new creator gets an
/// up-vote unless they had voted before; an existing vote is left as it is.
pub async fn claim_mapping(pool: &SqlitePool, mapping_id: i64, user_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO mapping_creators (mapping_id, user_id) VALUES (?, ?)",
    )
    .bind(mapping_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    get_or_create_vote(pool, user_id, mapping_id, None).await?;
    debug!("User {} claimed mapping {}", user_id, mapping_id);
    Ok(true)
}

/// Mark a mapping as accepted
///
/// Returns `(None, false)` when the mapping does not exist, `(mapping, false)`
/// when it was already accepted and `(mapping, true)` when this call accepted it.
pub async fn accept_mapping(pool: &SqlitePool, mapping_id: i64) -> Result<(Option<Mapping>, bool)> {
    let Some(mut mapping) = get_mapping_by_id(pool, mapping_id).await? else {
        return Ok((None, false));
    };

    if mapping.accepted {
        return Ok((Some(mapping), false));
    }

    sqlx::query("UPDATE mappings SET accepted = 1 WHERE id = ?")
        .bind(mapping_id)
        .execute(pool)
        .await?;

    mapping.accepted = true;
    info!("Accepted mapping {}", mapping_id);
    Ok((Some(mapping), true))
}

/// Emails of the users who proposed or claimed a mapping
pub async fn get_creators(pool: &SqlitePool, mapping_id: i64) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(
        r#"
        SELECT u.email FROM users u
        JOIN mapping_creators c ON c.user_id = u.id
        WHERE c.mapping_id = ?
        ORDER BY u.email
        "#,
    )
    .bind(mapping_id)
    .fetch_all(pool)
    .await?)
}

pub async fn summarize(pool: &SqlitePool, mapping: Mapping) -> Result<MappingSummary> {
    let VoteTally { up, down } = tally(pool, mapping.id).await?;
    let creators = get_creators(pool, mapping.id).await?;
    Ok(MappingSummary {
        mapping,
        up_votes: up,
        down_votes: down,
        creators,
    })
}

/// Mappings matching `filter`, ordered by id
pub async fn list_mappings(pool: &SqlitePool, filter: &MappingFilter) -> Result<Vec<Mapping>> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM mappings WHERE 1 = 1");

    if let Some(accepted) = filter.accepted {
        query.push(" AND accepted = ").push_bind(accepted);
    }
    if let Some(mapping_type) = filter.mapping_type {
        query.push(" AND type = ").push_bind(mapping_type.as_str());
    }
    if let Some(resource) = &filter.resource {
        query
            .push(" AND (service_1_name = ")
            .push_bind(resource.clone())
            .push(" OR service_2_name = ")
            .push_bind(resource.clone())
            .push(")");
    }
    query.push(" ORDER BY id");

    let rows = query.build().fetch_all(pool).await?;
    mappings_from_rows(&rows)
}

pub async fn list_mapping_summaries(
    pool: &SqlitePool,
    filter: &MappingFilter,
) -> Result<Vec<MappingSummary>> {
    let mut summaries = Vec::new();
    for mapping in list_mappings(pool, filter).await? {
        summaries.push(summarize(pool, mapping).await?);
    }
    Ok(summaries)
}

pub async fn get_all_mappings(pool: &SqlitePool) -> Result<Vec<Mapping>> {
    list_mappings(pool, &MappingFilter::default()).await
}

pub async fn get_all_accepted_mappings(pool: &SqlitePool) -> Result<Vec<Mapping>> {
    list_mappings(pool, &MappingFilter::accepted_only()).await
}

pub async fn get_mappings_by_type(
    pool: &SqlitePool,
    mapping_type: MappingType,
) -> Result<Vec<Mapping>> {
    let filter = MappingFilter {
        mapping_type: Some(mapping_type),
        ..MappingFilter::default()
    };
    list_mappings(pool, &filter).await
}

/// Mappings where either side belongs to `resource`
pub async fn get_mappings_by_resource(pool: &SqlitePool, resource: &str) -> Result<Vec<Mapping>> {
    let filter = MappingFilter {
        resource: Some(resource.to_string()),
        ..MappingFilter::default()
    };
    list_mappings(pool, &filter).await
}

/// Mappings with `pathway` on either side, any type
pub async fn get_mappings_by_pathway(
    pool: &SqlitePool,
    pathway: &PathwayReference,
) -> Result<Vec<Mapping>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM mappings
        WHERE (service_1_name = ?1 AND service_1_pathway_id = ?2 AND service_1_pathway_name = ?3)
           OR (service_2_name = ?1 AND service_2_pathway_id = ?2 AND service_2_pathway_name = ?3)
        ORDER BY id
        "#,
    )
    .bind(&pathway.resource)
    .bind(&pathway.pathway_id)
    .bind(&pathway.pathway_name)
    .fetch_all(pool)
    .await?;

    mappings_from_rows(&rows)
}

/// Mappings of one type with `pathway` on either side
pub async fn get_mappings_by_pathway_and_type(
    pool: &SqlitePool,
    pathway: &PathwayReference,
    mapping_type: MappingType,
) -> Result<Vec<Mapping>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM mappings
        WHERE type = ?4
          AND ((service_1_name = ?1 AND service_1_pathway_id = ?2 AND service_1_pathway_name = ?3)
            OR (service_2_name = ?1 AND service_2_pathway_id = ?2 AND service_2_pathway_name = ?3))
        ORDER BY id
        "#,
    )
    .bind(&pathway.resource)
    .bind(&pathway.pathway_id)
    .bind(&pathway.pathway_name)
    .bind(mapping_type.as_str())
    .fetch_all(pool)
    .await?;

    mappings_from_rows(&rows)
}

/// Mappings touching a pathway known only by resource and identifier
pub async fn get_mappings_by_pathway_id(
    pool: &SqlitePool,
    resource: &str,
    pathway_id: &str,
) -> Result<Vec<Mapping>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM mappings
        WHERE (service_1_name = ?1 AND service_1_pathway_id = ?2)
           OR (service_2_name = ?1 AND service_2_pathway_id = ?2)
        ORDER BY id
        "#,
    )
    .bind(resource)
    .bind(pathway_id)
    .fetch_all(pool)
    .await?;

    mappings_from_rows(&rows)
}

pub async fn count_mappings(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM mappings")
        .fetch_one(pool)
        .await?)
}

/// Delete one mapping with its votes and creator links
///
/// Children are removed explicitly inside one transaction, so the result does
/// not depend on the connection's foreign-key pragma.
pub async fn delete_mapping(pool: &SqlitePool, mapping_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM votes WHERE mapping_id = ?")
        .bind(mapping_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM mapping_creators WHERE mapping_id = ?")
        .bind(mapping_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM mappings WHERE id = ?")
        .bind(mapping_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Purge every mapping together with all votes and creator links
pub async fn delete_all_mappings(pool: &SqlitePool) -> Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM votes").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM mapping_creators")
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM mappings").execute(&mut *tx).await?;

    tx.commit().await?;
    info!("Deleted {} mappings", result.rows_affected());
    Ok(result.rows_affected())
}
