//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 键值存储层
//!
//! 定义存储后端接口、写命令、分片键命名规则以及原子发布器。

pub mod memory;
pub mod publisher;
pub mod redis_store;

use crate::error::Result;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use publisher::Publisher;
pub use redis_store::RedisStore;

/// 集群槽位数量
pub const SLOT_COUNT: u16 = 16384;

/// 流水线中的单条写命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp<'a> {
    /// HSET key field value
    HashSet {
        key: &'a str,
        field: &'a str,
        value: &'a str,
    },
    /// SADD key member
    SetAdd { key: &'a str, member: &'a str },
}

/// 键值存储后端
///
/// 单机和集群两种部署对调用方暴露相同的操作集合。
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 存活检查
    async fn ping(&self) -> Result<()>;

    /// 读取字符串值
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入字符串值
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 删除键，键不存在时视为成功
    async fn delete(&self, key: &str) -> Result<()>;

    /// 原子地将 `src` 重命名为 `dst`，覆盖 `dst` 原有的值
    async fn rename(&self, src: &str, dst: &str) -> Result<()>;

    /// 在一次往返中提交一批写命令，并等待所有应答
    async fn pipeline(&self, ops: &[WriteOp<'_>]) -> Result<()>;
}

/// 计算键所属的集群槽位
///
/// 若键中包含非空的 `{...}` 哈希标签，则只对标签内容取哈希。
pub fn key_slot(key: &str) -> u16 {
    crc16(hash_tag(key.as_bytes())) % SLOT_COUNT
}

fn hash_tag(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|&b| b == b'{') {
        if let Some(len) = key[open + 1..].iter().position(|&b| b == b'}') {
            if len > 0 {
                return &key[open + 1..open + 1 + len];
            }
        }
    }
    key
}

/// CRC16/XMODEM
fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// 逻辑键命名
///
/// 分片部署下用哈希标签包裹名称，使逻辑键与其临时键落在同一分区。
pub fn logical_key(name: &str, partitioned: bool) -> String {
    if partitioned {
        format!("{{{}}}", name)
    } else {
        name.to_string()
    }
}

/// 临时键命名，始终带哈希标签
///
/// # 参数
///
/// * `name` - 逻辑名称
/// * `millis` - 当前时间戳（毫秒）
/// * `seq` - 进程内单调序号，保证同一毫秒内也不重复
pub fn scratch_key(name: &str, millis: i64, seq: u64) -> String {
    format!("{{{}}}:temp:{}-{}", name, millis, seq)
}
