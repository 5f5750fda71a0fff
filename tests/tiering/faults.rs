//! Fault injection: deferred verification, quarantine, cleanup retries

use crate::common::*;
use serde_json::json;
use stratatier::{ColdKey, ColdStore, HotStore, RecordId, TieringConfig};

// ============================================================================
// Verification failures
// ============================================================================

#[tokio::test]
async fn failed_verification_keeps_hot_copy_and_archives_exactly_once() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("v1", 100, json!({"amount": 12.5}))]);
    cold.corrupt_next_gets(1);
    let tiering = tiering(&hot, &cold, test_config());

    let report = tiering.run_archival_pass().await.unwrap();

    assert_eq!(report.archived, 0);
    assert_eq!(report.deferred, 1);
    assert_eq!(report.quarantined, 0);
    assert!(hot.get(&RecordId::new("v1")).await.unwrap().is_some());
    assert_eq!(tiering.archival.deferred(), vec![RecordId::new("v1")]);

    wait_out_backoff().await;
    let retried = tiering.run_archival_pass().await.unwrap();

    assert_eq!(retried.archived, 1);
    assert_eq!(retried.deferred, 0);
    assert!(hot.get(&RecordId::new("v1")).await.unwrap().is_none());
    assert!(tiering.archival.deferred().is_empty());
    assert_eq!(cold.inner.len(), 1);
    assert_eq!(cold.inner.write_count(), 1);

    let again = tiering.run_archival_pass().await.unwrap();
    assert_eq!(again.archived, 0);
    assert_eq!(cold.inner.write_count(), 1);

    let found = tiering.get(&RecordId::new("v1")).await.unwrap();
    assert_eq!(found.record.payload, json!({"amount": 12.5}));
}

#[tokio::test]
async fn verification_read_outage_defers_to_next_pass() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("v2", 100, json!({"amount": 1}))]);
    // exhaust one full round of I/O retries
    let config = test_config();
    cold.fail_next_gets(config.io_max_attempts as usize);
    let tiering = tiering(&hot, &cold, config);

    let report = tiering.run_archival_pass().await.unwrap();

    assert_eq!(report.archived, 0);
    assert_eq!(report.deferred, 1);
    assert!(hot.get(&RecordId::new("v2")).await.unwrap().is_some());

    wait_out_backoff().await;
    let retried = tiering.run_archival_pass().await.unwrap();

    assert_eq!(retried.archived, 1);
    assert!(hot.get(&RecordId::new("v2")).await.unwrap().is_none());
    assert_eq!(cold.inner.write_count(), 1);
}

#[tokio::test]
async fn persistent_corruption_quarantines_after_ceiling() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("q1", 100, json!({"amount": 7}))]);
    let config = TieringConfig {
        max_retry_attempts: 3,
        ..test_config()
    };
    cold.corrupt_next_gets(1000);
    let tiering = tiering(&hot, &cold, config);

    // attempts accumulate across passes; the hot copy survives each one
    for _ in 0..2 {
        let report = tiering.run_archival_pass().await.unwrap();
        assert_eq!(report.deferred, 1);
        assert_eq!(report.quarantined, 0);
        assert!(hot.get(&RecordId::new("q1")).await.unwrap().is_some());
        wait_out_backoff().await;
    }

    let report = tiering.run_archival_pass().await.unwrap();
    assert_eq!(report.quarantined, 1);
    assert_eq!(report.deferred, 0);
    assert_eq!(report.quarantine[0].record_id, RecordId::new("q1"));
    assert_eq!(report.quarantine[0].attempts, 3);
    assert!(report.quarantine[0].last_error.contains("checksum mismatch"));
    assert!(tiering.archival.deferred().is_empty());

    // hot copy untouched and still served
    let found = tiering.get(&RecordId::new("q1")).await.unwrap();
    assert_eq!(found.source, stratatier::RetrievalSource::Hot);

    // excluded until cleared
    let next = tiering.run_archival_pass().await.unwrap();
    assert_eq!(next.skipped, 1);
    assert_eq!(next.archived, 0);

    assert!(tiering.archival.clear_quarantine(&RecordId::new("q1")).is_some());
    cold.corrupt_next_gets(0);
    let cleared = tiering.run_archival_pass().await.unwrap();
    assert_eq!(cleared.archived, 1);
    assert!(hot.get(&RecordId::new("q1")).await.unwrap().is_none());
    assert_eq!(cold.inner.write_count(), 1);
}

// ============================================================================
// Hot delete failures
// ============================================================================

#[tokio::test]
async fn failed_hot_delete_goes_to_cleanup_queue() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("c1", 100, json!({"amount": 3}))]);
    let config = test_config();
    hot.fail_next_deletes(config.io_max_attempts as usize);
    let tiering = tiering(&hot, &cold, config);

    let report = tiering.run_archival_pass().await.unwrap();

    assert_eq!(report.archived, 1);
    assert_eq!(report.cleanup_pending, 1);
    assert_eq!(tiering.archival.pending_cleanup(), vec![RecordId::new("c1")]);
    assert!(cold
        .exists(&ColdKey::for_record("records", &RecordId::new("c1")))
        .await
        .unwrap());

    // next pass drains the queue before scanning
    let next = tiering.run_archival_pass().await.unwrap();
    assert_eq!(next.cleanup_completed, 1);
    assert_eq!(next.cleanup_pending, 0);
    assert!(tiering.archival.pending_cleanup().is_empty());
    assert!(hot.get(&RecordId::new("c1")).await.unwrap().is_none());
    assert_eq!(cold.inner.write_count(), 1);
}

#[tokio::test]
async fn record_modified_during_migration_stays_hot() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("m1", 100, json!({"amount": 1}))]);
    hot.touch_before_delete();
    let tiering = tiering(&hot, &cold, test_config());

    let report = tiering.run_archival_pass().await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.archived, 0);

    let current = hot.get(&RecordId::new("m1")).await.unwrap().unwrap();
    assert_eq!(current.status, "touched");

    // the next pass archives the new version over the old artifact
    let next = tiering.run_archival_pass().await.unwrap();
    assert_eq!(next.archived, 1);
    let key = ColdKey::for_record("records", &RecordId::new("m1"));
    let header = cold.head(&key).await.unwrap().unwrap().header;
    assert_eq!(header.status, "touched");
    assert_eq!(cold.inner.len(), 1);

    // the rewritten envelope is what a cold read returns
    let found = tiering.get(&RecordId::new("m1")).await.unwrap();
    assert_eq!(found.source, stratatier::RetrievalSource::Cold);
    assert_eq!(found.record.status, "touched");
}
