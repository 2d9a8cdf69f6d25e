//! Voting engine
//!
//! At most one vote per (user, mapping). Casting a vote through
//! [`cast_vote`] re-checks the quorum and accepts the mapping once enough
//! up-votes have been collected.

use crate::db::mappings::{accept_mapping, get_mapping_by_id, Mapping};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vote {
    pub id: i64,
    pub mapping_id: i64,
    pub user_id: i64,
    /// true is an up-vote
    #[serde(rename = "type")]
    pub vote_type: bool,
    pub changed: DateTime<Utc>,
}

pub(crate) fn vote_from_row(row: &SqliteRow) -> Vote {
    Vote {
        id: row.get("id"),
        mapping_id: row.get("mapping_id"),
        user_id: row.get("user_id"),
        vote_type: row.get("type"),
        changed: row.get("changed"),
    }
}

/// Validated vote signal, `0` down and `1` up on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteSignal {
    Down,
    Up,
}

impl VoteSignal {
    pub fn is_up(self) -> bool {
        self == VoteSignal::Up
    }
}

impl TryFrom<i64> for VoteSignal {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(VoteSignal::Down),
            1 => Ok(VoteSignal::Up),
            other => Err(Error::InvalidVoteType(other.to_string())),
        }
    }
}

impl FromStr for VoteSignal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidVoteType(s.to_string()))
            .and_then(VoteSignal::try_from)
    }
}

/// Up/down counts of one mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteTally {
    pub up: i64,
    pub down: i64,
}

impl VoteTally {
    pub fn total(&self) -> i64 {
        self.up + self.down
    }

    pub fn is_acceptable(&self, quorum: i64) -> bool {
        self.up >= quorum
    }
}

/// Result of a user-facing vote
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub mapping: Mapping,
    pub tally: VoteTally,
    /// The vote completed the quorum and accepted the mapping
    pub newly_accepted: bool,
}

pub async fn get_vote(pool: &SqlitePool, user_id: i64, mapping_id: i64) -> Result<Option<Vote>> {
    let row = sqlx::query("SELECT * FROM votes WHERE user_id = ? AND mapping_id = ?")
        .bind(user_id)
        .bind(mapping_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(vote_from_row))
}

/// Record a vote, or update the existing one in place
///
/// With `vote_type == None` a missing vote is created as an up-vote and an
/// existing one is returned untouched. `Some(t)` overwrites a differing vote
/// and refreshes its `changed` timestamp.
pub async fn get_or_create_vote(
    pool: &SqlitePool,
    user_id: i64,
    mapping_id: i64,
    vote_type: Option<bool>,
) -> Result<Vote> {
    match get_vote(pool, user_id, mapping_id).await? {
        None => {
            sqlx::query(
                r#"
                INSERT INTO votes (mapping_id, user_id, type, changed) VALUES (?, ?, ?, ?)
                ON CONFLICT(mapping_id, user_id) DO NOTHING
                "#,
            )
            .bind(mapping_id)
            .bind(user_id)
            .bind(vote_type.unwrap_or(true))
            .bind(Utc::now())
            .execute(pool)
            .await?;
            debug!("User {} voted on mapping {}", user_id, mapping_id);
        }
        Some(vote) => match vote_type {
            Some(vote_type) if vote_type != vote.vote_type => {
                sqlx::query("UPDATE votes SET type = ?, changed = ? WHERE id = ?")
                    .bind(vote_type)
                    .bind(Utc::now())
                    .bind(vote.id)
                    .execute(pool)
                    .await?;
                debug!("User {} changed vote on mapping {}", user_id, mapping_id);
            }
            _ => return Ok(vote),
        },
    }

    get_vote(pool, user_id, mapping_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("vote on mapping {} vanished", mapping_id)))
}

pub async fn tally(pool: &SqlitePool, mapping_id: i64) -> Result<VoteTally> {
    let (up, down): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(CASE WHEN type = 1 THEN 1 ELSE 0 END), 0),
               COALESCE(SUM(CASE WHEN type = 0 THEN 1 ELSE 0 END), 0)
        FROM votes WHERE mapping_id = ?
        "#,
    )
    .bind(mapping_id)
    .fetch_one(pool)
    .await?;

    Ok(VoteTally { up, down })
}

/// Total number of votes in the store
pub async fn count_votes(pool: &SqlitePool) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM votes")
        .fetch_one(pool)
        .await?)
}

pub async fn get_votes_for_mapping(pool: &SqlitePool, mapping_id: i64) -> Result<Vec<Vote>> {
    let rows = sqlx::query("SELECT * FROM votes WHERE mapping_id = ? ORDER BY id")
        .bind(mapping_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(vote_from_row).collect())
}

/// Vote on a mapping and accept it once `quorum` up-votes are reached
pub async fn cast_vote(
    pool: &SqlitePool,
    user_id: i64,
    mapping_id: i64,
    signal: VoteSignal,
    quorum: i64,
) -> Result<VoteOutcome> {
    let mut mapping = get_mapping_by_id(pool, mapping_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("mapping {}", mapping_id)))?;

    let vote = get_or_create_vote(pool, user_id, mapping_id, Some(signal.is_up())).await?;
    let tally = tally(pool, mapping_id).await?;

    let mut newly_accepted = false;
    if tally.is_acceptable(quorum) && !mapping.accepted {
        let (accepted, changed) = accept_mapping(pool, mapping_id).await?;
        if let Some(accepted) = accepted {
            mapping = accepted;
        }
        newly_accepted = changed;
        if changed {
            info!(
                "Mapping {} reached {} up-votes and was accepted",
                mapping_id, tally.up
            );
        }
    }

    Ok(VoteOutcome {
        vote,
        mapping,
        tally,
        newly_accepted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_signal_parsing() {
        assert_eq!(VoteSignal::try_from(1).unwrap(), VoteSignal::Up);
        assert_eq!(VoteSignal::try_from(0).unwrap(), VoteSignal::Down);
        assert!(matches!(VoteSignal::try_from(2), Err(Error::InvalidVoteType(_))));
        assert_eq!("1".parse::<VoteSignal>().unwrap(), VoteSignal::Up);
        assert!(matches!("up".parse::<VoteSignal>(), Err(Error::InvalidVoteType(_))));
    }

    #[test]
    fn test_tally_quorum() {
        assert!(!VoteTally { up: 2, down: 0 }.is_acceptable(3));
        assert!(VoteTally { up: 3, down: 5 }.is_acceptable(3));
        assert_eq!(VoteTally { up: 3, down: 5 }.total(), 8);
    }
}
