//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了同步周期的编排、单元结果和周期元数据。

pub mod engine;
pub mod result;

pub use engine::SyncEngine;
pub use result::{
    truncate_message, CycleMarker, CycleStatus, CycleSummary, SyncResult, MAX_ERROR_LEN,
    SYNC_STATUS_KEY, SYNC_TIMESTAMP_KEY, SYNC_VERSION_KEY,
};
