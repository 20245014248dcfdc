//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 进程内存储后端
//!
//! 语义与 Redis 的 HSET/SADD/RENAME/DEL 一致，用于本地试运行和测试，
//! 并支持注入流水线故障、流水线延迟与重命名故障。

use super::{KvStore, WriteOp};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// 存储的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Str(String),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, Entry>,
    pipeline_calls: AtomicUsize,
    fail_pipeline_after: Mutex<Option<usize>>,
    delay_pipeline_after: Mutex<Option<(usize, Duration)>>,
    fail_rename: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前 `calls` 次流水线调用成功，之后的调用全部失败
    pub fn fail_pipeline_after(&self, calls: usize) {
        let mut guard = self
            .fail_pipeline_after
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *guard = Some(self.pipeline_calls.load(Ordering::SeqCst) + calls);
    }

    /// 前 `calls` 次流水线调用立即执行，之后的调用先等待 `delay`
    pub fn delay_pipeline_after(&self, calls: usize, delay: Duration) {
        let mut guard = self
            .delay_pipeline_after
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *guard = Some((self.pipeline_calls.load(Ordering::SeqCst) + calls, delay));
    }

    /// 使后续所有重命名失败
    pub fn fail_renames(&self, fail: bool) {
        self.fail_rename.store(fail, Ordering::SeqCst);
    }

    /// 清除所有故障注入
    pub fn clear_faults(&self) {
        *self
            .fail_pipeline_after
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
        *self
            .delay_pipeline_after
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = None;
        self.fail_rename.store(false, Ordering::SeqCst);
    }

    /// 已执行的流水线调用次数（含失败的调用）
    pub fn pipeline_calls(&self) -> usize {
        self.pipeline_calls.load(Ordering::SeqCst)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// 当前所有键，已排序
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn entry(&self, key: &str) -> Option<Entry> {
        self.data.get(key).map(|e| e.value().clone())
    }

    /// HGETALL，键不存在或类型不符时返回None
    pub fn hgetall(&self, key: &str) -> Option<HashMap<String, String>> {
        match self.entry(key)? {
            Entry::Hash(map) => Some(map),
            _ => None,
        }
    }

    /// SMEMBERS，键不存在或类型不符时返回None
    pub fn smembers(&self, key: &str) -> Option<HashSet<String>> {
        match self.entry(key)? {
            Entry::Set(set) => Some(set),
            _ => None,
        }
    }

    /// 直接写入一个条目，用于准备测试数据
    pub fn insert(&self, key: &str, entry: Entry) {
        self.data.insert(key.to_string(), entry);
    }

    fn apply(&self, op: &WriteOp<'_>) -> Result<()> {
        let wrong_type =
            || SyncError::Store("WRONGTYPE Operation against a key holding the wrong kind of value".to_string());
        match *op {
            WriteOp::HashSet { key, field, value } => {
                let mut entry = self
                    .data
                    .entry(key.to_string())
                    .or_insert_with(|| Entry::Hash(HashMap::new()));
                match entry.value_mut() {
                    Entry::Hash(map) => {
                        map.insert(field.to_string(), value.to_string());
                        Ok(())
                    }
                    _ => Err(wrong_type()),
                }
            }
            WriteOp::SetAdd { key, member } => {
                let mut entry = self
                    .data
                    .entry(key.to_string())
                    .or_insert_with(|| Entry::Set(HashSet::new()));
                match entry.value_mut() {
                    Entry::Set(set) => {
                        set.insert(member.to_string());
                        Ok(())
                    }
                    _ => Err(wrong_type()),
                }
            }
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.data.get(key) {
            Some(entry) => match entry.value() {
                Entry::Str(s) => Ok(Some(s.clone())),
                _ => Err(SyncError::Store(format!(
                    "WRONGTYPE key '{}' does not hold a string",
                    key
                ))),
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .insert(key.to_string(), Entry::Str(value.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<()> {
        if self.fail_rename.load(Ordering::SeqCst) {
            return Err(SyncError::Store(format!(
                "injected rename failure for '{}'",
                src
            )));
        }
        let (_, entry) = self
            .data
            .remove(src)
            .ok_or_else(|| SyncError::Store("ERR no such key".to_string()))?;
        self.data.insert(dst.to_string(), entry);
        Ok(())
    }

    async fn pipeline(&self, ops: &[WriteOp<'_>]) -> Result<()> {
        let call = self.pipeline_calls.fetch_add(1, Ordering::SeqCst);
        let limit = *self
            .fail_pipeline_after
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(limit) = limit {
            if call >= limit {
                return Err(SyncError::Store(format!(
                    "injected pipeline failure on call {}",
                    call + 1
                )));
            }
        }
        let delay = *self
            .delay_pipeline_after
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some((after, delay)) = delay {
            if call >= after {
                tokio::time::sleep(delay).await;
            }
        }
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }
}
