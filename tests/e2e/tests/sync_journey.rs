//! End-to-end journey over the Sync Engine: a fresh `init`, a full `build`
//! over a small corpus, and a subsequent `sync` that only picks up a
//! document modified after the new watermark.

use std::sync::Arc;

use chrono::Duration;
use medretrieve_core::sync::SyncEngine;
use medretrieve_core::testutil::FakeStore;

#[tokio::test]
async fn build_then_sync_only_reprocesses_newly_modified_documents() {
    let store = Arc::new(FakeStore::new());
    let now = chrono::Utc::now();

    store
        .seed_document("doc-a", "patient presents with chest pain and shortness of breath", now - Duration::hours(3))
        .await;
    store
        .seed_document("doc-b", "follow-up visit, prescribed aspirin for hypertension", now - Duration::hours(2))
        .await;

    let engine = SyncEngine::new(store.clone(), 50);
    engine.init().await.unwrap();

    let build_report = engine.build().await.unwrap();
    assert_eq!(build_report.processed, 2);
    assert!(build_report.failed.is_empty());

    let stats_after_build = engine.stats().await.unwrap();
    assert!(stats_after_build.total_entities > 0);
    assert!(stats_after_build.watermark.is_some());

    // Nothing changed: a second sync touches no documents.
    let idle_sync = engine.sync().await.unwrap();
    assert_eq!(idle_sync.processed, 0);

    // A brand new document arrives after the current watermark.
    store
        .seed_document("doc-c", "patient reports fatigue and headache today", now + Duration::hours(1))
        .await;

    let sync_report = engine.sync().await.unwrap();
    assert_eq!(sync_report.processed, 1);
    assert!(sync_report.new_watermark.unwrap() > stats_after_build.watermark.unwrap());

    let final_stats = engine.stats().await.unwrap();
    assert!(final_stats.total_entities > stats_after_build.total_entities);
}
