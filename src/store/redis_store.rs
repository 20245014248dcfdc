//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 基于 Redis 协议的存储后端（Redis / KVRocks），支持单机和集群两种部署。

use super::{KvStore, WriteOp};
use crate::config::{StoreConfig, StoreMode};
use crate::error::{Result, SyncError};
use crate::utils::redaction::redact_connection_string;
use async_trait::async_trait;
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::{Client, FromRedisValue, IntoConnectionInfo};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

/// Redis 存储后端
#[derive(Clone)]
pub enum RedisStore {
    Standalone { manager: ConnectionManager },
    Cluster { connection: ClusterConnection },
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standalone { .. } => write!(f, "RedisStore::Standalone"),
            Self::Cluster { .. } => write!(f, "RedisStore::Cluster"),
        }
    }
}

impl RedisStore {
    /// 按配置建立连接
    ///
    /// # 参数
    ///
    /// * `config` - 存储配置
    ///
    /// # 返回值
    ///
    /// 返回已连接的存储后端；连接失败或超时返回 `SyncError::Startup`
    #[instrument(skip(config), level = "info", name = "init_store", fields(mode = ?config.mode))]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let wait = Duration::from_millis(config.connection_timeout_ms);
        match config.mode {
            StoreMode::Standalone => {
                let url = config.connection_string.expose_secret();
                let mut info = url.into_connection_info().map_err(|e| {
                    SyncError::Config(format!(
                        "Invalid store connection string {}: {}",
                        redact_connection_string(url),
                        e
                    ))
                })?;
                if let Some(password) = &config.password {
                    info.redis.password = Some(password.expose_secret().to_string());
                }
                let client = Client::open(info)?;
                let manager = match timeout(wait, client.get_connection_manager()).await {
                    Ok(res) => res.map_err(|e| {
                        SyncError::Startup(format!(
                            "Failed to connect to store {}: {}",
                            redact_connection_string(url),
                            e
                        ))
                    })?,
                    Err(_) => {
                        return Err(SyncError::Startup(format!(
                            "Connection timed out after {}ms. Target: {}",
                            config.connection_timeout_ms,
                            redact_connection_string(url)
                        )));
                    }
                };
                info!("Connected to standalone store {}", redact_connection_string(url));
                Ok(RedisStore::Standalone { manager })
            }
            StoreMode::Cluster => {
                let mut builder = ClusterClient::builder(config.cluster_nodes.clone());
                if let Some(password) = &config.password {
                    builder = builder.password(password.expose_secret().to_string());
                }
                let client = builder.build()?;
                let connection = timeout(wait, client.get_async_connection())
                    .await
                    .map_err(|_| {
                        SyncError::Startup(format!(
                            "Cluster connection timed out after {}ms",
                            config.connection_timeout_ms
                        ))
                    })?
                    .map_err(|e| SyncError::Startup(format!("Failed to connect to cluster: {}", e)))?;
                info!(
                    "Connected to store cluster with {} seed nodes",
                    config.cluster_nodes.len()
                );
                Ok(RedisStore::Cluster { connection })
            }
        }
    }

    async fn query<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        match self {
            RedisStore::Standalone { manager } => Ok(run_cmd(cmd, &mut manager.clone()).await?),
            RedisStore::Cluster { connection } => {
                Ok(run_cmd(cmd, &mut connection.clone()).await?)
            }
        }
    }
}

async fn run_cmd<T, C>(cmd: &redis::Cmd, conn: &mut C) -> redis::RedisResult<T>
where
    T: FromRedisValue,
    C: ConnectionLike + Send,
{
    cmd.query_async(conn).await
}

async fn run_pipe<C>(pipe: &redis::Pipeline, conn: &mut C) -> redis::RedisResult<()>
where
    C: ConnectionLike + Send,
{
    pipe.query_async(conn).await
}

#[async_trait]
impl KvStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let pong: String = self.query(&redis::cmd("PING")).await?;
        debug!("Store ping: {}", pong);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query(&cmd).await
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        self.query(&cmd).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<()> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.query(&cmd).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn rename(&self, src: &str, dst: &str) -> Result<()> {
        let mut cmd = redis::cmd("RENAME");
        cmd.arg(src).arg(dst);
        self.query(&cmd).await
    }

    #[instrument(skip(self, ops), level = "debug", fields(ops = ops.len()))]
    async fn pipeline(&self, ops: &[WriteOp<'_>]) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for op in ops {
            match *op {
                WriteOp::HashSet { key, field, value } => {
                    pipe.hset(key, field, value).ignore();
                }
                WriteOp::SetAdd { key, member } => {
                    pipe.sadd(key, member).ignore();
                }
            }
        }

        match self {
            RedisStore::Standalone { manager } => run_pipe(&pipe, &mut manager.clone()).await?,
            RedisStore::Cluster { connection } => {
                run_pipe(&pipe, &mut connection.clone()).await?
            }
        }
        Ok(())
    }
}
