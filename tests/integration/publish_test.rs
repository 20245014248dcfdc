//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 原子发布集成测试

#[path = "../common/mod.rs"]
mod common;

use cachesync::config::StoreMode;
use cachesync::store::memory::Entry;
use cachesync::store::{key_slot, MemoryStore};
use cachesync::{Dataset, SyncError};
use common::{publisher, setup_logging, sync_config};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

fn stale_hash() -> Entry {
    Entry::Hash(HashMap::from([
        ("old".to_string(), "9".to_string()),
        ("k1".to_string(), "0".to_string()),
    ]))
}

fn sample() -> Dataset {
    Dataset::hash([("k1", 1), ("k2", 2), ("k3", 3), ("k4", 4), ("k5", 5)])
}

#[tokio::test]
async fn test_publish_replaces_whole_key() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.insert("appKeyAppIdMap", stale_hash());
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    publisher.publish("appKeyAppIdMap", &sample()).await.unwrap();

    let published = store.hgetall("appKeyAppIdMap").unwrap();
    assert_eq!(published.len(), 5);
    assert_eq!(published["k1"], "1");
    assert!(!published.contains_key("old"));
    // 不残留临时键
    assert_eq!(store.keys(), vec!["appKeyAppIdMap".to_string()]);
}

#[tokio::test]
async fn test_publish_set() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    publisher
        .publish("blackEventIdSet", &Dataset::set([101, 102, 103]))
        .await
        .unwrap();

    assert_eq!(
        store.smembers("blackEventIdSet"),
        Some(HashSet::from([
            "101".to_string(),
            "102".to_string(),
            "103".to_string()
        ]))
    );
}

#[tokio::test]
async fn test_empty_dataset_deletes_key() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.insert("blackUserPropSet", Entry::Set(HashSet::from(["1".to_string()])));
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    publisher
        .publish("blackUserPropSet", &Dataset::set(Vec::<i64>::new()))
        .await
        .unwrap();

    assert!(!store.exists("blackUserPropSet"));
    assert!(store.keys().is_empty());
}

#[tokio::test]
async fn test_pipeline_failure_keeps_previous_value() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.insert("appKeyAppIdMap", stale_hash());
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    // 5 个元素、批次大小 2：第二个批次失败
    store.fail_pipeline_after(1);
    let err = publisher
        .publish("appKeyAppIdMap", &sample())
        .await
        .unwrap_err();

    match err {
        SyncError::Publish { key, .. } => assert_eq!(key, "appKeyAppIdMap"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.entry("appKeyAppIdMap"), Some(stale_hash()));
    assert_eq!(store.keys(), vec!["appKeyAppIdMap".to_string()]);
}

#[tokio::test]
async fn test_batch_timeout_keeps_previous_value() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.insert("appKeyAppIdMap", stale_hash());
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    // 命令超时 1 秒，第二个批次挂起 5 秒
    store.delay_pipeline_after(1, Duration::from_secs(5));
    let err = publisher
        .publish("appKeyAppIdMap", &sample())
        .await
        .unwrap_err();

    match err {
        SyncError::Publish { key, reason } => {
            assert_eq!(key, "appKeyAppIdMap");
            assert!(reason.contains("exceeded"), "{}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(store.entry("appKeyAppIdMap"), Some(stale_hash()));
    assert_eq!(store.keys(), vec!["appKeyAppIdMap".to_string()]);
}

#[tokio::test]
async fn test_rename_failure_keeps_previous_value() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    store.insert("appKeyAppIdMap", stale_hash());
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    store.fail_renames(true);
    let result = publisher.publish("appKeyAppIdMap", &sample()).await;

    assert!(matches!(result, Err(SyncError::Publish { .. })));
    assert_eq!(store.entry("appKeyAppIdMap"), Some(stale_hash()));
    assert_eq!(store.keys(), vec!["appKeyAppIdMap".to_string()]);

    // 故障清除后下一次发布正常
    store.clear_faults();
    publisher.publish("appKeyAppIdMap", &sample()).await.unwrap();
    assert_eq!(store.hgetall("appKeyAppIdMap").map(|m| m.len()), Some(5));
}

#[tokio::test]
async fn test_publish_is_idempotent() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    let publisher = publisher(store.clone(), StoreMode::Standalone, &sync_config());

    publisher.publish("yearweek", &sample()).await.unwrap();
    let first = store.entry("yearweek");
    publisher.publish("yearweek", &sample()).await.unwrap();

    assert_eq!(store.entry("yearweek"), first);
    assert_eq!(store.keys().len(), 1);
}

#[tokio::test]
async fn test_cluster_mode_uses_hash_tagged_keys() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    let publisher = publisher(store.clone(), StoreMode::Cluster, &sync_config());

    assert!(publisher.is_partitioned());
    assert_eq!(publisher.logical_key("appIdEventIdMap"), "{appIdEventIdMap}");

    publisher
        .publish("appIdEventIdMap", &sample())
        .await
        .unwrap();

    assert_eq!(store.keys(), vec!["{appIdEventIdMap}".to_string()]);
    assert_eq!(
        key_slot("{appIdEventIdMap}"),
        key_slot("{appIdEventIdMap}:temp:1700000000000-1")
    );
}

#[tokio::test]
async fn test_concurrent_publishes_do_not_collide() {
    setup_logging();
    let store = Arc::new(MemoryStore::new());
    let publisher = Arc::new(publisher(store.clone(), StoreMode::Standalone, &sync_config()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let publisher = publisher.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("unit{}", i);
            publisher
                .publish(&name, &Dataset::set(0..(i + 1)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let keys = store.keys();
    assert_eq!(keys.len(), 8);
    assert!(keys.iter().all(|k| !k.contains(":temp:")));
    assert_eq!(store.smembers("unit7").map(|s| s.len()), Some(8));
}
