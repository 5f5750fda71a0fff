//! Facade lifecycle: persistent stores, configuration, CRUD

use crate::common::*;
use serde_json::json;
use std::sync::Arc;
use stratatier::{
    FsColdStore, HotStore, MemoryHotStore, RecordId, RetrievalSource, Tiering, TieringConfig,
};

// ============================================================================
// Persistent stores
// ============================================================================

#[tokio::test]
async fn archived_records_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let hot_path = dir.path().join("hot.jsonl");
    let cold_root = dir.path().join("cold");

    {
        let hot = Arc::new(MemoryHotStore::new());
        hot.insert_unchecked(aged("r1", 120, json!({"amount": 99.99})));
        hot.insert_unchecked(aged("r2", 5, json!({"amount": 1.5})));
        let tiering = Tiering::builder()
            .config(test_config())
            .hot(hot.clone())
            .cold(Arc::new(FsColdStore::open(&cold_root).unwrap()))
            .build()
            .unwrap();

        let report = tiering.run_archival_pass().await.unwrap();
        assert_eq!(report.archived, 1);
        hot.save_jsonl(&hot_path).unwrap();
    }

    let hot = Arc::new(MemoryHotStore::load_jsonl(&hot_path, test_config().max_record_size).unwrap());
    assert_eq!(hot.count().await.unwrap(), 1);
    let tiering = Tiering::builder()
        .config(test_config())
        .hot(hot)
        .cold(Arc::new(FsColdStore::open(&cold_root).unwrap()))
        .build()
        .unwrap();

    let archived = tiering.get(&RecordId::new("r1")).await.unwrap();
    assert_eq!(archived.source, RetrievalSource::Cold);
    assert_eq!(archived.record.payload, json!({"amount": 99.99}));

    let recent = tiering.get(&RecordId::new("r2")).await.unwrap();
    assert_eq!(recent.source, RetrievalSource::Hot);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn builder_rejects_invalid_configuration() {
    let config = TieringConfig {
        batch_size: 0,
        ..TieringConfig::default()
    };
    assert!(Tiering::builder().config(config).build().is_err());
}

#[tokio::test]
async fn configuration_from_toml_drives_the_pass() {
    let config = TieringConfig::from_toml_str(
        r#"
        archive_threshold_secs = 86400
        batch_size = 2
        retry_backoff_base_ms = 1
        retry_backoff_max_ms = 2
        retry_jitter = false
        "#,
    )
    .unwrap();
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed([aged("two-days", 2, json!({})), aged("today", 0, json!({}))]);
    let tiering = tiering(&hot, &cold, config);

    let report = tiering.run_archival_pass().await.unwrap();
    assert_eq!(report.archived, 1);
    assert!(hot.get(&RecordId::new("today")).await.unwrap().is_some());
}

// ============================================================================
// CRUD surface
// ============================================================================

#[tokio::test]
async fn create_update_delete_round() {
    let tiering = Tiering::builder().config(test_config()).build().unwrap();

    let created = tiering.records.create(None, json!({"amount": 10})).await.unwrap();
    let updated = tiering
        .records
        .update(&created.id, json!({"amount": 11}), None)
        .await
        .unwrap();
    assert_eq!(updated.payload, json!({"amount": 11}));

    let found = tiering.get(&created.id).await.unwrap();
    assert_eq!(found.source, RetrievalSource::Hot);
    assert_eq!(found.record.payload, json!({"amount": 11}));
    assert!(found.to_json().unwrap().get("retrieved_from_archive").is_none());

    tiering.records.delete(&created.id).await.unwrap();
    assert!(tiering.get(&created.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn background_pass_can_be_stopped() {
    let hot = FaultyHot::new();
    let cold = FaultyCold::new();
    hot.seed((0..5).map(|n| aged(&format!("b{}", n), 100, json!({ "n": n }))));
    let tiering = tiering(&hot, &cold, test_config());

    let handle = tiering.spawn_archival_pass(
        stratatier::PassOptions::from_config(tiering.config()).with_max_concurrency(1),
    );
    handle.stop();
    let report = handle.join().await.unwrap();

    // stopped before the task ran: nothing pulled, nothing lost
    assert!(report.cancelled);
    assert_eq!(report.archived + hot.count().await.unwrap() as u64, 5);
}
