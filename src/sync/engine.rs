//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 同步编排器
//!
//! 在有界并发与整体截止时间下运行所有启用的单元，单元失败互不影响。

use super::result::{CycleMarker, CycleStatus, CycleSummary, SyncResult};
use crate::catalog::{self, SyncUnit};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::extract::Extractor;
use crate::metrics::GLOBAL_METRICS;
use crate::store::{KvStore, Publisher};
use chrono::Local;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

/// 同步引擎
pub struct SyncEngine {
    extractor: Arc<Extractor>,
    publisher: Arc<Publisher>,
    store: Arc<dyn KvStore>,
    units: Vec<SyncUnit>,
    config: SyncConfig,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("units", &self.units.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SyncEngine {
    /// 创建同步引擎，使用完整的单元目录
    ///
    /// # 参数
    ///
    /// * `extractor` - 合并提取器
    /// * `publisher` - 原子发布器
    /// * `store` - 用于写入周期标记的存储
    /// * `config` - 同步配置
    pub fn new(
        extractor: Arc<Extractor>,
        publisher: Arc<Publisher>,
        store: Arc<dyn KvStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            extractor,
            publisher,
            store,
            units: catalog::all_units(),
            config,
        }
    }

    /// 替换单元目录
    pub fn with_units(mut self, units: Vec<SyncUnit>) -> Self {
        self.units = units;
        self
    }

    pub fn units(&self) -> &[SyncUnit] {
        &self.units
    }

    pub fn extractor(&self) -> &Arc<Extractor> {
        &self.extractor
    }

    /// 执行一个完整周期
    ///
    /// # 返回值
    ///
    /// 周期正常结束时返回汇总（可能包含失败单元）；截止时间到达或调度失败时返回致命错误
    #[instrument(skip(self), level = "info", name = "sync_cycle")]
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        info!("Starting full cache sync...");
        let started_at = Local::now();
        let start = Instant::now();

        self.extractor.reset();
        self.write_marker(&CycleMarker::running()).await;

        let units = catalog::filter_enabled(&self.units, self.config.enable_advertising);

        let pool_size = self.config.pool_size();
        info!("Dispatching {} units with pool size {}", units.len(), pool_size);

        let pool = Arc::new(Semaphore::new(pool_size));
        let mut tasks = JoinSet::new();
        for (index, unit) in units.iter().copied().enumerate() {
            let pool = pool.clone();
            let extractor = self.extractor.clone();
            let publisher = self.publisher.clone();
            tasks.spawn(async move {
                let _permit = pool
                    .acquire_owned()
                    .await
                    .map_err(|e| SyncError::Dispatch(e.to_string()))?;
                let result = AssertUnwindSafe(run_unit(&unit, &extractor, &publisher))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        let message = panic_message(panic.as_ref());
                        error!("Unit {} panicked: {}", unit.name, message);
                        let mut result = SyncResult::begin(unit.name);
                        result.fail(&format!("panicked: {}", message));
                        result
                    });
                Ok::<_, SyncError>((index, result))
            });
        }

        let mut slots: Vec<Option<SyncResult>> = vec![None; units.len()];
        let collected = timeout(self.config.cycle_timeout(), async {
            while let Some(joined) = tasks.join_next().await {
                let (index, result) =
                    joined.map_err(|e| SyncError::Dispatch(format!("unit task failed: {}", e)))??;
                GLOBAL_METRICS.record_unit(&result);
                slots[index] = Some(result);
            }
            Ok::<_, SyncError>(())
        })
        .await;

        match collected {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tasks.abort_all();
                error!("Cycle aborted: {}", e);
                GLOBAL_METRICS.record_aborted_cycle();
                return Err(e);
            }
            Err(_) => {
                tasks.abort_all();
                let pending = slots.iter().filter(|s| s.is_none()).count();
                error!(
                    "Cycle exceeded {}s deadline with {} units outstanding",
                    self.config.timeout_seconds, pending
                );
                GLOBAL_METRICS.record_aborted_cycle();
                return Err(SyncError::Timeout(format!(
                    "cycle exceeded {}s with {} of {} units outstanding",
                    self.config.timeout_seconds,
                    pending,
                    units.len()
                )));
            }
        }

        let results: Vec<SyncResult> = slots.into_iter().flatten().collect();
        let status = if results.iter().all(|r| r.success) {
            CycleStatus::Success
        } else {
            CycleStatus::PartialFailure
        };

        self.write_marker(&CycleMarker::completed(status)).await;

        let summary = CycleSummary {
            status,
            results,
            started_at,
            elapsed: start.elapsed(),
        };
        GLOBAL_METRICS.record_cycle(status, summary.elapsed.as_secs_f64());

        for line in summary.to_string().lines() {
            info!("{}", line);
        }
        for failed in summary.failed() {
            error!(
                unit = %failed.name,
                "Failed unit: {}",
                failed.error_message.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(summary)
    }

    /// 写入周期标记，失败只记录日志
    async fn write_marker(&self, marker: &CycleMarker) {
        match marker.write(self.store.as_ref()).await {
            Ok(()) => info!("Cycle marker {} at {}", marker.status, marker.timestamp),
            Err(e) => warn!("Failed to write cycle marker {}: {}", marker.status, e),
        }
    }
}

async fn run_unit(unit: &SyncUnit, extractor: &Extractor, publisher: &Publisher) -> SyncResult {
    let mut result = SyncResult::begin(unit.name);
    let outcome = async {
        let dataset = unit.produce(extractor).await?;
        publisher.publish(unit.name, &dataset).await?;
        Ok::<_, SyncError>(dataset.len())
    }
    .await;

    match outcome {
        Ok(count) => {
            result.finish(count as u64);
            info!("Synced {} - {} records", unit.name, count);
        }
        Err(e) => {
            error!("Failed to sync {}: {}", unit.name, e);
            result.fail(&e.to_string());
        }
    }
    result
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
