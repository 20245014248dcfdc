//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了测试的通用工具函数和设置。

#![allow(dead_code)]

use async_trait::async_trait;
use cachesync::config::{StoreConfig, StoreMode, SyncConfig};
use cachesync::source::{Query, Row, SeaOrmSource, SourceReader, Value};
use cachesync::store::{KvStore, MemoryStore, Publisher};
use cachesync::{Extractor, Result, SyncEngine, SyncError};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn setup_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn int(v: i64) -> Value {
    Value::Int(v)
}

pub fn text(v: &str) -> Value {
    Value::Text(v.to_string())
}

/// 按查询名称返回预置行的数据源，记录每个查询的执行次数
#[derive(Default)]
pub struct ScriptedSource {
    rows: HashMap<&'static str, Vec<Row>>,
    failing: HashSet<&'static str>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, query: &Query, rows: Vec<Row>) -> Self {
        self.rows.insert(query.name, rows);
        self
    }

    pub fn failing(mut self, query: &Query) -> Self {
        self.failing.insert(query.name);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 查询被执行的次数
    pub fn calls(&self, query: &Query) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(query.name)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SourceReader for ScriptedSource {
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(query.name.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(query.name) {
            return Err(SyncError::SourceRow(format!("query {} failed", query.name)));
        }
        Ok(self.rows.get(query.name).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE company_app (id INTEGER, app_key TEXT, company_id INTEGER, is_delete INTEGER, \
     stop INTEGER, auto_event INTEGER, event_sum INTEGER, attr_sum INTEGER)",
    "CREATE TABLE tmp_transfer (id INTEGER, status INTEGER)",
    "CREATE TABLE user_prop_meta (id INTEGER, app_id INTEGER, owner TEXT, name TEXT, is_delete INTEGER, \
     attr_type INTEGER, sql_json TEXT, table_fields TEXT)",
    "CREATE TABLE event (id INTEGER, app_id INTEGER, owner TEXT, event_name TEXT, is_delete INTEGER, \
     is_stop INTEGER)",
    "CREATE TABLE event_attr (event_id INTEGER, attr_id INTEGER, attr_name TEXT, owner TEXT, \
     is_delete INTEGER, is_stop INTEGER, attr_type INTEGER, alias_name TEXT, column_name TEXT, sql_json TEXT)",
    "CREATE TABLE app (main_id INTEGER, sdk_platform INTEGER, has_data INTEGER)",
    "CREATE TABLE device_prop (app_id INTEGER, owner TEXT, name TEXT, id INTEGER)",
    "CREATE TABLE app_data (app_id INTEGER)",
    "CREATE TABLE event_platform (event_id INTEGER, platform INTEGER)",
    "CREATE TABLE event_attr_platform (event_attr_id INTEGER, platform INTEGER)",
    "CREATE TABLE device_prop_platform (prop_id INTEGER, platform INTEGER)",
    "CREATE TABLE advertising_app (app_key TEXT, is_delete INTEGER, stop INTEGER)",
    "CREATE TABLE ads_link_event (link_id INTEGER, event_id INTEGER, event_ids TEXT, channel_event TEXT, \
     match_json TEXT, frequency INTEGER, windows_time INTEGER, is_delete INTEGER)",
    "CREATE TABLE ads_frequency_first (event_id INTEGER, link_id INTEGER, zg_id TEXT)",
    "CREATE TABLE virtual_event (event_name TEXT, alias_name TEXT, app_id INTEGER, event_json TEXT, \
     is_delete INTEGER, event_status INTEGER)",
    "CREATE TABLE kudu_exchange (base_name TEXT, current_name TEXT)",
    "CREATE TABLE app_custom_config (app_id INTEGER, app_config_type TEXT, app_config TEXT)",
    "CREATE TABLE etl_yearkweek (day INTEGER, year_week INTEGER)",
    "CREATE TABLE business (company_id INTEGER, identifier TEXT, del INTEGER, state INTEGER)",
];

const SEED: &[&str] = &[
    // 1、2 有效；3 已删除；4 已迁移
    "INSERT INTO company_app VALUES (1, 'k1', 10, 0, 0, 1, 100, 100), (2, 'k2', 20, 0, 0, 0, 1, 1), \
     (3, 'k3', 30, 1, 0, 1, 100, 100), (4, 'k4', 40, 0, 0, 1, 100, 100)",
    "INSERT INTO tmp_transfer VALUES (4, 2), (1, 1)",
    "INSERT INTO user_prop_meta VALUES (1, 1, 'zg', 'Gender', 0, 0, NULL, NULL), \
     (2, 1, 'zg', 'vip', 0, 1, '{\"a\":1}', 't.f'), (3, 2, 'zg', 'old', 1, 0, NULL, NULL)",
    "INSERT INTO event VALUES (100, 1, 'zg', 'Login', 0, 0), (101, 1, 'zg', 'Pay', 0, 1), \
     (102, 2, 'zg', 'Open', 0, 0)",
    "INSERT INTO event_attr VALUES (100, 1000, 'Channel', 'zg', 0, 0, 0, 'channel_alias', 'cus1', NULL), \
     (100, 1001, 'score', 'zg', 0, 0, 1, NULL, NULL, '{\"x\":1}'), \
     (102, 1002, 'Ver', 'zg', 1, 0, 0, NULL, 'cus2', NULL)",
    "INSERT INTO app VALUES (1, 1, 1), (1, 2, 0)",
    "INSERT INTO device_prop VALUES (1, 'zg', 'os', 7)",
    "INSERT INTO app_data VALUES (1)",
    "INSERT INTO event_platform VALUES (100, 1), (100, 2)",
    "INSERT INTO event_attr_platform VALUES (1000, 1)",
    "INSERT INTO device_prop_platform VALUES (7, 3)",
    "INSERT INTO advertising_app VALUES ('k1', 0, 0), ('k2', 0, 1)",
    "INSERT INTO ads_link_event VALUES (5, 100, '100,101', 'activate', '{}', 1, NULL, 0), \
     (6, 101, NULL, NULL, NULL, 0, 3600, 0), (7, 102, NULL, 'gone', NULL, 0, 0, 1)",
    "INSERT INTO ads_frequency_first VALUES (100, 5, 'z1')",
    "INSERT INTO virtual_event VALUES ('vLogin', 'virtual login', 1, \
     '{\"owner\":\"zg\",\"eventName\":\"Login\",\"attrs\":[\"b\",\"a\"]}', 0, 0), \
     ('vBroken', NULL, 1, 'not json', 0, 0), \
     ('vOff', NULL, 2, '{\"owner\":\"zg\",\"eventName\":\"Open\"}', 0, 1)",
    "INSERT INTO kudu_exchange VALUES ('event_log', 'event_log_v2')",
    "INSERT INTO app_custom_config VALUES (1, 'id_mapping', 'true'), (3, 'id_mapping', 'true'), \
     (2, 'other', 'true')",
    "INSERT INTO etl_yearkweek VALUES (20250101, 202501)",
    "INSERT INTO business VALUES (10, 'crm', 0, 1), (20, 'erp', 1, 1)",
];

/// 建立带有完整表结构和种子数据的内存 SQLite 连接
pub async fn sqlite_connection() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("Failed to open in-memory sqlite");
    for statement in SCHEMA.iter().chain(SEED) {
        db.execute_unprepared(statement)
            .await
            .unwrap_or_else(|e| panic!("Failed to execute {}: {}", statement, e));
    }
    db
}

/// 基于种子数据的 SQLite 数据源
pub async fn sqlite_source() -> SeaOrmSource {
    SeaOrmSource::from_connection(sqlite_connection().await)
}

pub fn store_config(mode: StoreMode) -> StoreConfig {
    StoreConfig {
        mode,
        cluster_nodes: match mode {
            StoreMode::Cluster => vec!["redis://127.0.0.1:7000".to_string()],
            StoreMode::Standalone => Vec::new(),
        },
        command_timeout_ms: 1000,
        ..StoreConfig::default()
    }
}

pub fn sync_config() -> SyncConfig {
    SyncConfig {
        pipeline_batch_size: 2,
        timeout_seconds: 10,
        worker_threads: Some(4),
        ..SyncConfig::default()
    }
}

pub fn publisher(store: Arc<MemoryStore>, mode: StoreMode, sync: &SyncConfig) -> Publisher {
    Publisher::new(store, &store_config(mode), sync)
}

/// 在内存存储上组装同步引擎
pub fn engine(
    source: Arc<dyn SourceReader>,
    store: Arc<MemoryStore>,
    sync: SyncConfig,
) -> SyncEngine {
    let extractor = Arc::new(Extractor::new(source));
    let publisher = Arc::new(publisher(store.clone(), StoreMode::Standalone, &sync));
    let kv: Arc<dyn KvStore> = store;
    SyncEngine::new(extractor, publisher, kv, sync)
}
