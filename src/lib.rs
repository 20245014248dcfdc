//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! cachesync - 关系型元数据到 Redis/KVRocks 的全量缓存同步
//!
//! 周期性地从配置库读取元数据，派生出一组缓存单元，
//! 通过临时键写入加原子重命名的方式整体替换缓存中的旧数据。

#![doc(html_root_url = "https://docs.rs/cachesync/0.1.0")]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod manager;
pub mod metrics;
pub mod source;
pub mod store;
pub mod sync;
pub mod telemetry;
pub mod utils;

// Re-export commonly used items
pub use catalog::{all_units, enabled_units, SyncUnit, UnitGroup};
pub use config::Config;
pub use dataset::{Dataset, Shape};
pub use error::{Result, SyncError};
pub use extract::Extractor;
pub use manager::SyncManager;
pub use source::{SeaOrmSource, SourceReader};
pub use store::{KvStore, MemoryStore, Publisher, RedisStore};
pub use sync::{CycleSummary, SyncEngine, SyncResult};

/// cachesync 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
