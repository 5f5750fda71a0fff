//! Archival pass behavior

use crate::common::*;
use serde_json::json;
use stratatier::{content_hash, ColdKey, ColdStore, Error, HotStore, RecordId, StopSignal};

// ============================================================================
// Example scenario
// ============================================================================

#[tokio::test]
async fn aged_record_moves_to_cold_and_stays_readable() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("r1", 120, json!({"amount": 99.99}))]);
    let tiering = tiering(&hot, &cold, test_config());

    let report = tiering.run_archival_pass().await.unwrap();
    assert_eq!(report.archived, 1);
    assert_eq!(report.quarantined, 0);

    let id = RecordId::new("r1");
    assert!(hot.get(&id).await.unwrap().is_none());

    let key = ColdKey::for_record("records", &id);
    assert!(cold.exists(&key).await.unwrap());
    let manifest = cold.head(&key).await.unwrap().unwrap().manifest;
    assert_eq!(manifest.content_hash, content_hash(br#"{"amount":99.99}"#));
    assert_eq!(manifest.record_id, id);

    let found = tiering.get(&id).await.unwrap();
    assert_eq!(found.source, stratatier::RetrievalSource::Cold);
    assert_eq!(found.record.payload, json!({"amount": 99.99}));

    let payload = found.annotated_payload();
    assert_eq!(payload["amount"], json!(99.99));
    assert_eq!(payload["retrieved_from_archive"], json!(true));
    assert!(payload["retrieval_timestamp"].is_string());
}

#[tokio::test]
async fn recent_records_stay_hot() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("old", 200, json!({"n": 1})), aged("fresh", 3, json!({"n": 2}))]);
    let tiering = tiering(&hot, &cold, test_config());

    let report = tiering.run_archival_pass().await.unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.archived, 1);
    assert!(hot.get(&RecordId::new("fresh")).await.unwrap().is_some());
    assert_eq!(cold.inner.len(), 1);
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn second_pass_is_a_no_op() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed((0..25).map(|n| aged(&format!("r{}", n), 100 + n, json!({ "n": n }))));
    let tiering = tiering(&hot, &cold, test_config());

    let first = tiering.run_archival_pass().await.unwrap();
    assert_eq!(first.archived, 25);
    assert_eq!(cold.inner.write_count(), 25);

    let second = tiering.run_archival_pass().await.unwrap();
    assert_eq!(second.scanned, 0);
    assert_eq!(second.archived, 0);
    assert_eq!(cold.inner.len(), 25);
    assert_eq!(cold.inner.write_count(), 25);
}

#[tokio::test]
async fn existing_identical_artifact_is_not_rewritten() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    let record = aged("r1", 150, json!({"amount": 5}));
    hot.seed([record.clone()]);
    let tiering = tiering(&hot, &cold, test_config());

    // A previous run wrote the artifact but died before deleting the hot copy
    tiering.run_archival_pass().await.unwrap();
    hot.seed([record]);
    let writes = cold.inner.write_count();

    let report = tiering.run_archival_pass().await.unwrap();
    assert_eq!(report.archived, 1);
    assert_eq!(cold.inner.write_count(), writes);
    assert!(hot.get(&RecordId::new("r1")).await.unwrap().is_none());
}

#[tokio::test]
async fn pagination_visits_every_record_once() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed((0..37).map(|n| aged(&format!("p{:02}", n), 95, json!({ "n": n }))));
    let config = stratatier::TieringConfig {
        batch_size: 4,
        max_concurrency: 3,
        ..test_config()
    };
    let tiering = tiering(&hot, &cold, config);

    let report = tiering.run_archival_pass().await.unwrap();

    assert_eq!(report.scanned, 37);
    assert_eq!(report.archived, 37);
    assert_eq!(cold.puts(), 37);
    assert_eq!(hot.count().await.unwrap(), 0);
}

// ============================================================================
// Pass control
// ============================================================================

#[tokio::test]
async fn overlapping_pass_is_rejected() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("slow", 100, json!({}))]);
    cold.delay_gets(std::time::Duration::from_millis(200));
    let tiering = tiering(&hot, &cold, test_config());

    let running = tiering.spawn_archival_pass(stratatier::PassOptions::from_config(tiering.config()));
    while !tiering.archival.is_running() {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    let err = tiering.run_archival_pass().await.unwrap_err();
    assert!(matches!(err, Error::PassInProgress));

    let report = running.join().await.unwrap();
    assert_eq!(report.archived, 1);
}

#[tokio::test]
async fn stop_lets_in_flight_record_finish_and_pulls_no_more() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed((0..10).map(|n| aged(&format!("s{}", n), 100, json!({ "n": n }))));
    let tiering = tiering(&hot, &cold, test_config());

    let stop = StopSignal::new();
    cold.stop_on_put(stop.clone());
    let options = stratatier::PassOptions::from_config(tiering.config()).with_max_concurrency(1);

    let report = tiering.archival.run_pass(&options, &stop).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.archived, 1);
    assert_eq!(hot.count().await.unwrap(), 9);

    // resuming later picks up exactly what is left
    let resumed = tiering.run_archival_pass().await.unwrap();
    assert_eq!(resumed.archived, 9);
    assert!(!resumed.cancelled);
    assert_eq!(cold.inner.len(), 10);
}
