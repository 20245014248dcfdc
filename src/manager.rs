//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步管理器，负责按配置建立连接并组装同步引擎。

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::extract::Extractor;
use crate::source::{SeaOrmSource, SourceReader};
use crate::store::{KvStore, Publisher, RedisStore};
use crate::sync::{CycleSummary, SyncEngine};
use std::sync::Arc;
use tracing::{info, instrument};

/// 同步管理器
///
/// 持有数据源与存储连接，连接在启动时建立一次，随管理器释放。
pub struct SyncManager {
    source: Arc<dyn SourceReader>,
    store: Arc<dyn KvStore>,
    engine: SyncEngine,
    config: Config,
}

impl SyncManager {
    /// 初始化同步管理器
    ///
    /// 连接数据源与存储并做存活检查，任一失败都是启动级致命错误。
    ///
    /// # 参数
    ///
    /// * `config` - 已验证的配置
    #[instrument(skip(config), level = "info", fields(mode = ?config.store.mode))]
    pub async fn init(config: Config) -> Result<Self> {
        config.validate().map_err(SyncError::Config)?;

        let source: Arc<dyn SourceReader> = Arc::new(SeaOrmSource::connect(&config.source).await?);
        let store: Arc<dyn KvStore> = Arc::new(RedisStore::connect(&config.store).await?);

        let manager = Self::with_backends(config, source, store);
        manager.check_liveness().await?;
        info!("SyncManager initialized");
        Ok(manager)
    }

    /// 使用已有的数据源与存储组装
    pub fn with_backends(
        config: Config,
        source: Arc<dyn SourceReader>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        let extractor = Arc::new(Extractor::new(source.clone()));
        let publisher = Arc::new(Publisher::new(store.clone(), &config.store, &config.sync));
        let engine = SyncEngine::new(extractor, publisher, store.clone(), config.sync.clone());
        Self {
            source,
            store,
            engine,
            config,
        }
    }

    /// 数据源与存储的存活检查
    pub async fn check_liveness(&self) -> Result<()> {
        self.source.ping().await?;
        self.store
            .ping()
            .await
            .map_err(|e| SyncError::Startup(format!("Store health check failed: {}", e)))?;
        Ok(())
    }

    /// 执行一个同步周期
    pub async fn run_once(&self) -> Result<CycleSummary> {
        self.engine.run_cycle().await
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
