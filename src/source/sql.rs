//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 基于 sea-orm 的数据源实现，支持 MySQL 和 SQLite。

use super::{ColumnKind, Query, Row, SourceReader, Value};
use crate::config::SourceConfig;
use crate::error::{Result, SyncError};
use crate::utils::redaction::redact_connection_string;
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, QueryResult, Statement,
};
use secrecy::ExposeSecret;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// sea-orm 数据源
pub struct SeaOrmSource {
    connection: DatabaseConnection,
}

impl std::fmt::Debug for SeaOrmSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaOrmSource")
            .field("backend", &self.connection.get_database_backend())
            .finish()
    }
}

impl SeaOrmSource {
    /// 建立连接池
    #[instrument(skip(config), level = "info", name = "init_source")]
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let url = config.url.expose_secret().to_string();
        let mut opt = ConnectOptions::new(url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms * 2))
            .sqlx_logging(false);

        let start = Instant::now();
        let wait = Duration::from_millis(config.connect_timeout_ms * 3);
        let connection = match timeout(wait, Database::connect(opt)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(SyncError::Startup(format!(
                    "Failed to connect to source {}: {}",
                    redact_connection_string(&url),
                    e
                )));
            }
            Err(_) => {
                return Err(SyncError::Startup(format!(
                    "Connection to source {} timed out after {:?}",
                    redact_connection_string(&url),
                    wait
                )));
            }
        };

        let elapsed = start.elapsed();
        info!(
            "Source connection established in {:?}: {}",
            elapsed,
            redact_connection_string(&url)
        );
        if elapsed > Duration::from_secs(3) {
            warn!("Source connection took longer than expected: {:?}", elapsed);
        }

        Ok(Self { connection })
    }

    /// 使用已有连接构建数据源
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }
}

/// 读取文本列；数值列按十进制字符串返回
fn read_text(result: &QueryResult, column: &str) -> Result<Option<String>> {
    match result.try_get::<Option<String>>("", column) {
        Ok(value) => Ok(value),
        Err(e) => match result.try_get::<Option<i64>>("", column) {
            Ok(number) => Ok(number.map(|n| n.to_string())),
            Err(_) => Err(e.into()),
        },
    }
}

#[async_trait]
impl SourceReader for SeaOrmSource {
    #[instrument(skip(self, query), level = "debug", fields(query = query.name))]
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>> {
        let backend = self.connection.get_database_backend();
        let results = self
            .connection
            .query_all(Statement::from_string(backend, query.sql.to_string()))
            .await?;

        let mut rows = Vec::with_capacity(results.len());
        for result in &results {
            let mut row = Row::new();
            for column in query.columns {
                let value = match column.kind {
                    ColumnKind::Int => result
                        .try_get::<Option<i64>>("", column.name)?
                        .map(Value::Int),
                    ColumnKind::Text => read_text(result, column.name)?.map(Value::Text),
                };
                row.insert(column.name, value.unwrap_or(Value::Null));
            }
            rows.push(row);
        }

        debug!("Query {} returned {} rows", query.name, rows.len());
        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        let backend = self.connection.get_database_backend();
        self.connection
            .execute(Statement::from_string(backend, "SELECT 1".to_string()))
            .await
            .map_err(|e| SyncError::Startup(format!("Source health check failed: {}", e)))?;
        Ok(())
    }
}
