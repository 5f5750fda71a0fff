//! Retrieval across tiers

use crate::common::*;
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use stratatier::{RecordId, RetrievalSource};

// ============================================================================
// Single flight
// ============================================================================

#[tokio::test]
async fn concurrent_cold_reads_coalesce_into_one_get() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("r2", 120, json!({"amount": 42}))]);
    let tiering = tiering(&hot, &cold, test_config());
    tiering.run_archival_pass().await.unwrap();

    let gets_before = cold.gets();
    cold.delay_gets(Duration::from_millis(50));

    let id = RecordId::new("r2");
    let results = join_all((0..16).map(|_| tiering.get(&id))).await;

    assert_eq!(cold.gets() - gets_before, 1);
    let first = results[0].as_ref().unwrap();
    for result in &results {
        let retrieval = result.as_ref().unwrap();
        assert_eq!(retrieval.record, first.record);
        assert_eq!(retrieval.source, RetrievalSource::Cold);
    }
}

#[tokio::test]
async fn two_simultaneous_reads_return_identical_payload() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("r2", 120, json!({"amount": 7.25}))]);
    let tiering = tiering(&hot, &cold, test_config());
    tiering.run_archival_pass().await.unwrap();
    let gets_before = cold.gets();

    let id = RecordId::new("r2");
    let (a, b) = tokio::join!(tiering.get(&id), tiering.get(&id));

    assert_eq!(a.unwrap().record.payload, b.unwrap().record.payload);
    assert_eq!(cold.gets() - gets_before, 1);
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn repeated_reads_hit_the_cache() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("c1", 120, json!({"amount": 1}))]);
    let tiering = tiering(&hot, &cold, test_config());
    tiering.run_archival_pass().await.unwrap();
    let gets_before = cold.gets();

    let id = RecordId::new("c1");
    let first = tiering.get(&id).await.unwrap();
    let second = tiering.get(&id).await.unwrap();

    assert_eq!(first.source, RetrievalSource::Cold);
    assert_eq!(second.source, RetrievalSource::Cache);
    assert!(second.retrieved_from_archive());
    assert_eq!(cold.gets() - gets_before, 1);

    let stats = tiering.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.len, 1);
}

#[tokio::test]
async fn writing_a_record_invalidates_its_cached_snapshot() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("r3", 120, json!({"amount": 1}))]);
    let tiering = tiering(&hot, &cold, test_config());
    tiering.run_archival_pass().await.unwrap();

    let id = RecordId::new("r3");
    assert_eq!(tiering.get(&id).await.unwrap().source, RetrievalSource::Cold);

    tiering
        .records
        .create(Some(id.clone()), json!({"amount": 2}))
        .await
        .unwrap();

    let fresh = tiering.get(&id).await.unwrap();
    assert_eq!(fresh.source, RetrievalSource::Hot);
    assert_eq!(fresh.record.payload, json!({"amount": 2}));
}

// ============================================================================
// Batch retrieval
// ============================================================================

#[tokio::test]
async fn batch_retrieval_mixes_tiers_in_request_order() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("cold-1", 120, json!({"n": 1})), aged("hot-1", 1, json!({"n": 2}))]);
    let tiering = tiering(&hot, &cold, test_config());
    tiering.run_archival_pass().await.unwrap();

    let ids = vec![
        RecordId::new("hot-1"),
        RecordId::new("nope"),
        RecordId::new("cold-1"),
    ];
    let results = tiering.get_many(&ids).await;

    assert_eq!(results[0].as_ref().unwrap().source, RetrievalSource::Hot);
    assert!(results[1].as_ref().unwrap_err().is_not_found());
    let archived = results[2].as_ref().unwrap();
    assert_eq!(archived.source, RetrievalSource::Cold);
    assert_eq!(archived.record.payload, json!({"n": 1}));
}

#[tokio::test]
async fn unknown_record_is_not_found() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    let tiering = tiering(&hot, &cold, test_config());

    let err = tiering.get(&RecordId::new("missing")).await.unwrap_err();
    assert!(err.is_not_found());
}
