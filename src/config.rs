//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存同步的配置结构和解析逻辑。

use crate::error::{Result, SyncError};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 顶层配置
///
/// 启动时构建一次，之后以引用方式传递给各组件
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// 关系型数据源配置
    pub source: SourceConfig,
    /// 键值存储配置
    #[serde(default)]
    pub store: StoreConfig,
    /// 同步行为配置
    #[serde(default)]
    pub sync: SyncConfig,
}

/// 数据源配置
#[derive(Deserialize, Clone, Debug)]
pub struct SourceConfig {
    /// 连接字符串（mysql:// 或 sqlite:）
    pub url: SecretString,
    /// 连接池最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 连接超时时间（毫秒）
    #[serde(default = "default_source_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_source_timeout_ms() -> u64 {
    5000
}

/// 键值存储部署模式
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// 单机模式
    #[default]
    Standalone,
    /// 集群（分片）模式
    Cluster,
}

/// 键值存储配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct StoreConfig {
    /// 部署模式
    pub mode: StoreMode,
    /// 单机模式连接字符串
    pub connection_string: SecretString,
    /// 集群初始节点列表
    pub cluster_nodes: Vec<String>,
    /// 密码（可选）
    pub password: Option<SecretString>,
    /// 连接超时时间（毫秒）
    pub connection_timeout_ms: u64,
    /// 命令执行超时时间（毫秒），同时约束每个流水线批次的等待时间
    pub command_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: StoreMode::Standalone,
            connection_string: SecretString::new("redis://127.0.0.1:6379".into()),
            cluster_nodes: Vec::new(),
            password: None,
            connection_timeout_ms: 5000,
            command_timeout_ms: 60000,
        }
    }
}

impl StoreConfig {
    /// 是否为分片部署
    pub fn is_partitioned(&self) -> bool {
        self.mode == StoreMode::Cluster
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// 同步行为配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SyncConfig {
    /// 是否同步投放相关的缓存单元
    pub enable_advertising: bool,
    /// 批量写入大小
    pub batch_size: usize,
    /// 流水线批次大小
    pub pipeline_batch_size: usize,
    /// 是否使用流水线写入
    pub use_pipeline: bool,
    /// 单个同步周期的超时时间（秒）
    pub timeout_seconds: u64,
    /// 工作池大小，默认取可用CPU数
    pub worker_threads: Option<usize>,
    /// 存在失败单元时是否以非零状态退出
    pub fail_on_partial_failure: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enable_advertising: true,
            batch_size: 1000,
            pipeline_batch_size: 500,
            use_pipeline: true,
            timeout_seconds: 300,
            worker_threads: None,
            fail_on_partial_failure: false,
        }
    }
}

impl SyncConfig {
    /// 实际使用的流水线批次大小
    pub fn effective_batch_size(&self) -> usize {
        if self.use_pipeline {
            self.pipeline_batch_size
        } else {
            1
        }
    }

    /// 工作池大小，至少为 1
    pub fn pool_size(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    /// 从TOML文件加载配置并验证
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置并验证
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate().map_err(SyncError::Config)?;
        Ok(config)
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有值在合理范围内
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.source.max_connections == 0 {
            return Err("source.max_connections cannot be zero".to_string());
        }

        if self.store.mode == StoreMode::Cluster && self.store.cluster_nodes.is_empty() {
            return Err("store.cluster_nodes must not be empty in cluster mode".to_string());
        }

        let timeout = self.store.connection_timeout_ms;
        if !(100..=30000).contains(&timeout) {
            return Err("store.connection_timeout_ms must be between 100 and 30000 ms".to_string());
        }

        if self.store.command_timeout_ms < 100 {
            return Err("store.command_timeout_ms must be at least 100 ms".to_string());
        }

        if self.sync.pipeline_batch_size == 0 || self.sync.pipeline_batch_size > 10000 {
            return Err("sync.pipeline_batch_size must be between 1 and 10000".to_string());
        }

        if self.sync.batch_size == 0 || self.sync.batch_size > 100000 {
            return Err("sync.batch_size must be between 1 and 100000".to_string());
        }

        if self.sync.timeout_seconds == 0 {
            return Err("sync.timeout_seconds cannot be zero".to_string());
        }

        if self.sync.timeout_seconds > 86400 {
            return Err("sync.timeout_seconds cannot exceed 86400 seconds".to_string());
        }

        if self.sync.worker_threads == Some(0) {
            return Err("sync.worker_threads cannot be zero".to_string());
        }

        Ok(())
    }
}
