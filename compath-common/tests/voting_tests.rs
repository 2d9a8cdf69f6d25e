//! Voting engine: one vote per user and mapping, quorum acceptance

mod helpers;

use compath_common::db::mappings::{
    claim_mapping, get_mapping_by_id, get_or_create_mapping, list_mapping_summaries, Mapping,
    MappingFilter,
};
use compath_common::db::votes::*;
use compath_common::model::VOTE_ACCEPTANCE;
use compath_common::{Error, MappingType};
use helpers::*;

async fn proposed_mapping(store: &TestStore, creator: i64) -> Mapping {
    get_or_create_mapping(
        &store.pool,
        &store.registry,
        kegg_glycolysis(),
        reactome_glycolysis(),
        MappingType::EquivalentTo,
        creator,
    )
    .await
    .unwrap()
    .0
}

#[tokio::test]
async fn test_repeated_vote_updates_in_place() {
    let store = setup().await;
    let creator = user(&store.pool, "creator@example.org").await;
    let voter = user(&store.pool, "voter@example.org").await;
    let mapping = proposed_mapping(&store, creator).await;

    let down = get_or_create_vote(&store.pool, voter, mapping.id, Some(false))
        .await
        .unwrap();
    assert!(!down.vote_type);

    let up = get_or_create_vote(&store.pool, voter, mapping.id, Some(true))
        .await
        .unwrap();
    assert_eq!(up.id, down.id);
    assert!(up.vote_type);
    assert!(up.changed >= down.changed);

    let votes: Vec<Vote> = get_votes_for_mapping(&store.pool, mapping.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|vote| vote.user_id == voter)
        .collect();
    assert_eq!(votes.len(), 1);
    assert!(votes[0].vote_type);
}

#[tokio::test]
async fn test_vote_without_type_keeps_existing_vote() {
    let store = setup().await;
    let creator = user(&store.pool, "creator@example.org").await;
    let voter = user(&store.pool, "voter@example.org").await;
    let mapping = proposed_mapping(&store, creator).await;

    get_or_create_vote(&store.pool, voter, mapping.id, Some(false))
        .await
        .unwrap();
    let unchanged = get_or_create_vote(&store.pool, voter, mapping.id, None)
        .await
        .unwrap();
    assert!(!unchanged.vote_type);

    // Claiming after a down-vote does not turn it into an up-vote
    assert!(claim_mapping(&store.pool, mapping.id, voter).await.unwrap());
    assert!(!get_vote(&store.pool, voter, mapping.id).await.unwrap().unwrap().vote_type);
}

#[tokio::test]
async fn test_quorum_accepts_mapping() {
    let store = setup().await;
    let creator = user(&store.pool, "creator@example.org").await;
    let second = user(&store.pool, "second@example.org").await;
    let third = user(&store.pool, "third@example.org").await;
    let mapping = proposed_mapping(&store, creator).await;

    let outcome = cast_vote(&store.pool, second, mapping.id, VoteSignal::Up, VOTE_ACCEPTANCE)
        .await
        .unwrap();
    assert_eq!(outcome.tally, VoteTally { up: 2, down: 0 });
    assert!(!outcome.newly_accepted);
    assert!(!outcome.mapping.accepted);

    let summary = &list_mapping_summaries(&store.pool, &MappingFilter::default())
        .await
        .unwrap()[0];
    assert!(!summary.is_acceptable(VOTE_ACCEPTANCE));

    let outcome = cast_vote(&store.pool, third, mapping.id, VoteSignal::Up, VOTE_ACCEPTANCE)
        .await
        .unwrap();
    assert_eq!(outcome.tally.up, 3);
    assert!(outcome.newly_accepted);
    assert!(outcome.mapping.accepted);
    assert!(get_mapping_by_id(&store.pool, mapping.id)
        .await
        .unwrap()
        .unwrap()
        .accepted);

    // A later vote on an accepted mapping changes nothing about acceptance
    let outcome = cast_vote(&store.pool, third, mapping.id, VoteSignal::Down, VOTE_ACCEPTANCE)
        .await
        .unwrap();
    assert_eq!(outcome.tally, VoteTally { up: 2, down: 1 });
    assert!(!outcome.newly_accepted);
    assert!(outcome.mapping.accepted);
}

#[tokio::test]
async fn test_vote_on_missing_mapping() {
    let store = setup().await;
    let voter = user(&store.pool, "voter@example.org").await;

    let result = cast_vote(&store.pool, voter, 4242, VoteSignal::Up, VOTE_ACCEPTANCE).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(count_votes(&store.pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_custom_quorum() {
    let store = setup().await;
    let creator = user(&store.pool, "creator@example.org").await;
    let voter = user(&store.pool, "voter@example.org").await;
    let mapping = proposed_mapping(&store, creator).await;

    let outcome = cast_vote(&store.pool, voter, mapping.id, VoteSignal::Up, 2)
        .await
        .unwrap();
    assert!(outcome.newly_accepted);
}
