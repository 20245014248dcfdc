//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 单元结果、周期标记与周期汇总

use crate::error::Result;
use crate::store::KvStore;
use chrono::{DateTime, Local};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::warn;

/// 周期状态键
pub const SYNC_STATUS_KEY: &str = "sync:status";
/// 周期时间戳键
pub const SYNC_TIMESTAMP_KEY: &str = "sync:timestamp";
/// 周期版本键
pub const SYNC_VERSION_KEY: &str = "sync:version";

/// 时间戳格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 错误信息的最大长度（字节）
pub const MAX_ERROR_LEN: usize = 512;

/// 单个单元一次执行的结果
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub name: String,
    pub record_count: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub elapsed: Duration,
    pub success: bool,
    pub error_message: Option<String>,
    start: Instant,
}

impl SyncResult {
    /// 单元开始执行时创建
    pub fn begin(name: &str) -> Self {
        Self {
            name: name.to_string(),
            record_count: 0,
            started_at: Local::now(),
            finished_at: None,
            elapsed: Duration::ZERO,
            success: false,
            error_message: None,
            start: Instant::now(),
        }
    }

    pub fn finish(&mut self, record_count: u64) {
        self.record_count = record_count;
        self.success = true;
        self.stop();
    }

    pub fn fail(&mut self, message: &str) {
        self.success = false;
        self.error_message = Some(truncate_message(message, MAX_ERROR_LEN));
        self.stop();
    }

    fn stop(&mut self) {
        self.finished_at = Some(Local::now());
        self.elapsed = self.start.elapsed();
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] count={}, cost={}ms, success={}, error={}",
            self.name,
            self.record_count,
            self.elapsed_ms(),
            self.success,
            self.error_message.as_deref().unwrap_or("null")
        )
    }
}

/// 截断到不超过 `max` 字节，且落在字符边界上
pub fn truncate_message(message: &str, max: usize) -> String {
    if message.len() <= max {
        return message.to_string();
    }
    let mut end = max;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

/// 周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Running,
    Success,
    PartialFailure,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Running => "RUNNING",
            CycleStatus::Success => "SUCCESS",
            CycleStatus::PartialFailure => "PARTIAL_FAILURE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RUNNING" => Some(CycleStatus::Running),
            "SUCCESS" => Some(CycleStatus::Success),
            "PARTIAL_FAILURE" => Some(CycleStatus::PartialFailure),
            _ => None,
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已发布的周期元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleMarker {
    pub status: CycleStatus,
    pub timestamp: String,
    /// 周期完成时的毫秒时间戳，RUNNING 标记不携带
    pub version: Option<i64>,
}

impl CycleMarker {
    pub fn running() -> Self {
        Self {
            status: CycleStatus::Running,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            version: None,
        }
    }

    pub fn completed(status: CycleStatus) -> Self {
        let now = Local::now();
        Self {
            status,
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            version: Some(now.timestamp_millis()),
        }
    }

    /// 写入存储，标记键不做分片包装
    pub async fn write(&self, store: &dyn KvStore) -> Result<()> {
        store.set(SYNC_STATUS_KEY, self.status.as_str()).await?;
        store.set(SYNC_TIMESTAMP_KEY, &self.timestamp).await?;
        if let Some(version) = self.version {
            store.set(SYNC_VERSION_KEY, &version.to_string()).await?;
        }
        Ok(())
    }

    /// 读取已发布的标记，状态键不存在时返回None
    pub async fn read(store: &dyn KvStore) -> Result<Option<Self>> {
        let Some(raw) = store.get(SYNC_STATUS_KEY).await? else {
            return Ok(None);
        };
        let Some(status) = CycleStatus::parse(&raw) else {
            warn!("Unknown cycle status in store: {}", raw);
            return Ok(None);
        };
        let timestamp = store.get(SYNC_TIMESTAMP_KEY).await?.unwrap_or_default();
        let version = store
            .get(SYNC_VERSION_KEY)
            .await?
            .and_then(|v| v.parse().ok());
        Ok(Some(Self {
            status,
            timestamp,
            version,
        }))
    }
}

/// 一个周期的汇总
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub status: CycleStatus,
    /// 每个已调度单元一条结果，按目录顺序
    pub results: Vec<SyncResult>,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl CycleSummary {
    pub fn total_records(&self) -> u64 {
        self.results.iter().map(|r| r.record_count).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &SyncResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.status == CycleStatus::Success
    }

    pub fn result(&self, name: &str) -> Option<&SyncResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failed_count();
        writeln!(f, "========================================")?;
        writeln!(f, "Cache Sync Summary ({})", self.status)?;
        writeln!(
            f,
            "Started: {}",
            self.started_at.format(TIMESTAMP_FORMAT)
        )?;
        writeln!(
            f,
            "Total tasks: {}, Success: {}, Failed: {}",
            self.results.len(),
            self.results.len() - failed,
            failed
        )?;
        writeln!(
            f,
            "Total records: {}, Time: {} ms",
            self.total_records(),
            self.elapsed.as_millis()
        )?;
        writeln!(f, "========================================")?;
        for result in &self.results {
            writeln!(f, "{}", result)?;
        }
        if failed > 0 {
            writeln!(f, "Failed tasks:")?;
            for result in self.failed() {
                writeln!(
                    f,
                    "  - {}: {}",
                    result.name,
                    result.error_message.as_deref().unwrap_or("unknown error")
                )?;
            }
        }
        Ok(())
    }
}
