//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 合并提取层集成测试

#[path = "../common/mod.rs"]
mod common;

use cachesync::extract::queries;
use cachesync::source::{Column, Query, Row};
use cachesync::{Extractor, SourceReader};
use common::{int, setup_logging, sqlite_source, text, ScriptedSource};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn company_rows() -> Vec<Row> {
    vec![
        Row::from_pairs([
            ("id", int(1)),
            ("app_key", text("k1")),
            ("company_id", int(10)),
            ("is_delete", int(0)),
            ("stop", int(0)),
            ("auto_event", int(1)),
        ]),
        Row::from_pairs([
            ("id", int(2)),
            ("app_key", text("k2")),
            ("company_id", int(20)),
            ("is_delete", int(0)),
            ("stop", int(0)),
            ("auto_event", int(0)),
        ]),
    ]
}

fn event_rows() -> Vec<Row> {
    vec![
        Row::from_pairs([
            ("id", int(100)),
            ("app_id", int(1)),
            ("owner", text("zg")),
            ("event_name", text("Login")),
            ("is_delete", int(0)),
            ("is_stop", int(0)),
        ]),
        Row::from_pairs([
            ("id", int(101)),
            ("app_id", int(1)),
            ("owner", text("zg")),
            ("event_name", text("login")),
            ("is_delete", int(0)),
            ("is_stop", int(0)),
        ]),
    ]
}

fn attr_rows() -> Vec<Row> {
    vec![Row::from_pairs([
        ("event_id", int(100)),
        ("attr_id", int(1000)),
        ("attr_name", text("Channel")),
        ("owner", text("zg")),
        ("is_delete", int(0)),
        ("is_stop", int(0)),
        ("attr_type", int(0)),
        ("column_name", text("cus1")),
    ])]
}

const NUMERIC_TEXT: Query = Query {
    name: "numeric_text",
    sql: "SELECT event_id, link_id AS zg_id, zg_id AS label FROM ads_frequency_first",
    columns: &[
        Column::int("event_id"),
        Column::text("zg_id"),
        Column::text("label"),
    ],
};

fn scripted() -> ScriptedSource {
    ScriptedSource::new()
        .with_rows(&queries::COMPANY_APP, company_rows())
        .with_rows(&queries::EVENT, event_rows())
        .with_rows(&queries::EVENT_ATTR, attr_rows())
}

#[tokio::test]
async fn test_concurrent_callers_share_one_scan() {
    setup_logging();
    let source = Arc::new(scripted().with_delay(Duration::from_millis(50)));
    let extractor = Arc::new(Extractor::new(source.clone()));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let extractor = extractor.clone();
        handles.push(tokio::spawn(async move { extractor.company_app().await }));
    }
    let mut views = Vec::new();
    for handle in handles {
        views.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(source.calls(&queries::COMPANY_APP), 1);
    assert_eq!(source.calls(&queries::TRANSFERRED_APPS), 1);
    assert!(views.iter().all(|v| Arc::ptr_eq(v, &views[0])));
}

#[tokio::test]
async fn test_dependent_views_reuse_generation() {
    setup_logging();
    let source = Arc::new(scripted());
    let extractor = Extractor::new(source.clone());

    let (events, attrs, apps) = tokio::join!(
        extractor.events(),
        extractor.event_attrs(),
        extractor.company_app()
    );
    events.unwrap();
    attrs.unwrap();
    apps.unwrap();

    assert_eq!(source.calls(&queries::EVENT), 1);
    assert_eq!(source.calls(&queries::EVENT_ATTR), 1);
    assert_eq!(source.calls(&queries::COMPANY_APP), 1);
}

#[tokio::test]
async fn test_reset_forces_rescan() {
    setup_logging();
    let source = Arc::new(scripted());
    let extractor = Extractor::new(source.clone());

    let before = extractor.company_app().await.unwrap();
    extractor.company_app().await.unwrap();
    assert_eq!(source.calls(&queries::COMPANY_APP), 1);

    extractor.reset();
    let after = extractor.company_app().await.unwrap();

    assert_eq!(source.calls(&queries::COMPANY_APP), 2);
    assert!(!Arc::ptr_eq(&before, &after));
    // 旧视图仍可读
    assert_eq!(before.app_key_app_id["k1"], 1);
}

#[tokio::test]
async fn test_failed_scan_is_not_memoized() {
    setup_logging();
    let source = Arc::new(scripted().failing(&queries::EVENT));
    let extractor = Extractor::new(source.clone());

    assert!(extractor.events().await.is_err());
    assert!(extractor.events().await.is_err());
    assert_eq!(source.calls(&queries::EVENT), 2);
}

#[tokio::test]
async fn test_event_keys_preserve_case_attr_keys_fold() {
    setup_logging();
    let extractor = Extractor::new(Arc::new(scripted()));

    let events = extractor.events().await.unwrap();
    assert_eq!(events.event_id["1_zg_Login"], 100);
    assert_eq!(events.event_id["1_zg_login"], 101);

    let attrs = extractor.event_attrs().await.unwrap();
    assert_eq!(attrs.attr_id["1_100_zg_CHANNEL"], 1000);
    assert!(!attrs.attr_id.contains_key("1_100_zg_Channel"));
}

#[tokio::test]
async fn test_lookups_against_sqlite() {
    setup_logging();
    let source: Arc<dyn SourceReader> = Arc::new(sqlite_source().await);
    let extractor = Extractor::new(source);

    assert_eq!(
        extractor.forbidden_create_event_app_ids().await.unwrap(),
        HashSet::from([2])
    );
    assert_eq!(
        extractor.forbidden_create_attr_event_ids().await.unwrap(),
        HashSet::from([102])
    );
    assert_eq!(
        extractor.event_platforms().await.unwrap(),
        HashSet::from(["100_1".to_string(), "100_2".to_string()])
    );

    let channels = extractor.link_channel_events().await.unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels["5_100"], "activate");

    let links = extractor.ads_link_events().await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links["100_5"].window_time, 2_592_000);
    assert_eq!(links["101_6"].window_time, 3600);

    let cdp = extractor.open_cdp().await.unwrap();
    assert_eq!(cdp.len(), 1);
    assert_eq!(cdp["1"], "true");
}

#[tokio::test]
async fn test_virtual_events_against_sqlite() {
    setup_logging();
    let source: Arc<dyn SourceReader> = Arc::new(sqlite_source().await);
    let extractor = Extractor::new(source);

    let events = extractor.virtual_events().await.unwrap();
    assert_eq!(events.len(), 1);
    let defs = &events["1_zg_Login"];
    assert_eq!(defs.len(), 1);
    let json = serde_json::to_value(&defs[0]).unwrap();
    assert_eq!(json["virtual_name"], "vLogin");
    assert_eq!(json["virtual_alias"], "virtual login");

    let attrs = extractor.virtual_event_attrs().await.unwrap();
    let names: Vec<_> = attrs["1_vLogin_zg_Login"].iter().cloned().collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

    assert_eq!(
        extractor.virtual_event_app_ids().await.unwrap(),
        HashSet::from(["1".to_string()])
    );
    assert_eq!(
        extractor.virtual_prop_app_ids().await.unwrap(),
        HashSet::from(["1".to_string()])
    );
}

#[tokio::test]
async fn test_numeric_column_read_as_text() {
    setup_logging();
    let source = sqlite_source().await;

    let rows = source.fetch(&NUMERIC_TEXT).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].int("event_id"), 100);
    assert_eq!(rows[0].text("zg_id"), Some("5"));
    assert_eq!(rows[0].text("label"), Some("z1"));
}
