//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存同步引擎的错误类型和处理机制。

use thiserror::Error;

/// 同步引擎错误类型枚举
///
/// 单元级错误（Source/Redis/Store/Publish/Serialization）由编排器捕获并记录到
/// `SyncResult`；周期级错误（Timeout/Dispatch）和启动级错误（Startup）会传播到进程边界。
#[derive(Error, Debug)]
pub enum SyncError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 关系型数据源错误
    #[error("Source error: {0}")]
    Source(#[from] sea_orm::DbErr),

    /// 数据源返回了无法解释的行
    #[error("Source row error: {0}")]
    SourceRow(String),

    /// Redis错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 存储后端错误
    #[error("Store error: {0}")]
    Store(String),

    /// 原子发布失败，逻辑键保持不变
    #[error("Publish of '{key}' failed: {reason}")]
    Publish { key: String, reason: String },

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 超时错误
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// 工作池调度失败
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// 启动失败（连接或存活检查）
    #[error("Startup error: {0}")]
    Startup(String),
}

impl SyncError {
    /// 是否为周期级致命错误
    pub fn is_cycle_fatal(&self) -> bool {
        matches!(self, SyncError::Timeout(_) | SyncError::Dispatch(_))
    }
}

/// 同步操作结果类型别名
pub type Result<T> = std::result::Result<T, SyncError>;
