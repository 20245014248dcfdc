//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 原子发布器
//!
//! 数据集先完整写入一个新的临时键，再通过 RENAME 一步替换逻辑键。
//! 读者在任何时刻只会看到旧的完整数据集或新的完整数据集。

use super::{logical_key, scratch_key, KvStore, WriteOp};
use crate::config::{StoreConfig, SyncConfig};
use crate::dataset::Dataset;
use crate::error::{Result, SyncError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

/// 原子发布器
pub struct Publisher {
    store: Arc<dyn KvStore>,
    partitioned: bool,
    pipeline_batch_size: usize,
    progress_interval: usize,
    command_timeout: Duration,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("partitioned", &self.partitioned)
            .field("pipeline_batch_size", &self.pipeline_batch_size)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl Publisher {
    /// 创建发布器
    ///
    /// # 参数
    ///
    /// * `store` - 存储后端
    /// * `store_config` - 存储配置（部署模式、命令超时）
    /// * `sync_config` - 同步配置（批次大小）
    pub fn new(store: Arc<dyn KvStore>, store_config: &StoreConfig, sync_config: &SyncConfig) -> Self {
        Self {
            store,
            partitioned: store_config.is_partitioned(),
            pipeline_batch_size: sync_config.effective_batch_size().max(1),
            progress_interval: sync_config.batch_size.max(1),
            command_timeout: store_config.command_timeout(),
        }
    }

    pub fn is_partitioned(&self) -> bool {
        self.partitioned
    }

    /// 名称对应的逻辑键
    pub fn logical_key(&self, name: &str) -> String {
        logical_key(name, self.partitioned)
    }

    /// 以数据集原子替换逻辑键的内容
    ///
    /// 空数据集直接删除逻辑键。失败时尽力删除临时键，逻辑键保持原值，
    /// 并返回 `SyncError::Publish`。
    ///
    /// # 参数
    ///
    /// * `name` - 缓存单元名称
    /// * `dataset` - 完整数据集
    #[instrument(skip(self, dataset), level = "debug", fields(size = dataset.len()))]
    pub async fn publish(&self, name: &str, dataset: &Dataset) -> Result<()> {
        let target = self.logical_key(name);

        if dataset.is_empty() {
            return self
                .bounded(self.store.delete(&target))
                .await
                .map_err(|e| publish_error(name, e));
        }

        let millis = chrono::Utc::now().timestamp_millis();
        let seq = SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed);
        let scratch = scratch_key(name, millis, seq);

        let outcome = match self.write_scratch(name, &scratch, dataset).await {
            Ok(()) => self.bounded(self.store.rename(&scratch, &target)).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!("Atomic replace {} -> {}, {} elements", scratch, target, dataset.len());
                Ok(())
            }
            Err(e) => {
                if let Err(cleanup) = self.bounded(self.store.delete(&scratch)).await {
                    warn!("Failed to remove scratch key {}: {}", scratch, cleanup);
                }
                Err(publish_error(name, e))
            }
        }
    }

    async fn write_scratch(&self, name: &str, scratch: &str, dataset: &Dataset) -> Result<()> {
        let total = dataset.len();
        let mut batch: Vec<WriteOp<'_>> = Vec::with_capacity(self.pipeline_batch_size.min(total));
        let mut staged = 0usize;

        match dataset {
            Dataset::Hash(map) => {
                for (field, value) in map {
                    batch.push(WriteOp::HashSet {
                        key: scratch,
                        field,
                        value,
                    });
                    if batch.len() >= self.pipeline_batch_size {
                        staged += self.flush(&mut batch).await?;
                        self.report(name, staged, total);
                    }
                }
            }
            Dataset::Set(set) => {
                for member in set {
                    batch.push(WriteOp::SetAdd {
                        key: scratch,
                        member,
                    });
                    if batch.len() >= self.pipeline_batch_size {
                        staged += self.flush(&mut batch).await?;
                        self.report(name, staged, total);
                    }
                }
            }
        }

        staged += self.flush(&mut batch).await?;
        debug!("Staged {} elements for {} into {}", staged, name, scratch);
        Ok(())
    }

    async fn flush(&self, batch: &mut Vec<WriteOp<'_>>) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let count = batch.len();
        self.bounded(self.store.pipeline(batch)).await?;
        batch.clear();
        Ok(count)
    }

    fn report(&self, name: &str, staged: usize, total: usize) {
        let before = staged.saturating_sub(self.pipeline_batch_size);
        if staged / self.progress_interval > before / self.progress_interval {
            debug!("{}: staged {}/{} elements", name, staged, total);
        }
    }

    async fn bounded<F>(&self, fut: F) -> Result<()>
    where
        F: std::future::Future<Output = Result<()>>,
    {
        match timeout(self.command_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(SyncError::Timeout(format!(
                "store command exceeded {:?}",
                self.command_timeout
            ))),
        }
    }
}

fn publish_error(name: &str, cause: SyncError) -> SyncError {
    SyncError::Publish {
        key: name.to_string(),
        reason: cause.to_string(),
    }
}
