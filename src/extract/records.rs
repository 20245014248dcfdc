//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 以JSON文本发布的类型化记录

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 投放链接默认的归因窗口（秒），30天
pub const DEFAULT_WINDOW_TIME: i64 = 2_592_000;

/// 虚拟用户属性定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPropDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub define: Option<String>,
    #[serde(rename = "tableFields", skip_serializing_if = "Option::is_none")]
    pub table_fields: Option<String>,
}

/// 虚拟事件属性定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualAttrDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub define: Option<String>,
}

/// 投放链接事件
///
/// 字段按名称字母序声明，输出顺序稳定。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsLinkEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_event: Option<String>,
    pub event_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_ids: Option<String>,
    pub frequency: i64,
    pub link_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_json: Option<String>,
    pub window_time: i64,
}

impl AdsLinkEvent {
    /// 非正的窗口时间回落到默认值
    pub fn normalize_window(window_time: i64) -> i64 {
        if window_time > 0 {
            window_time
        } else {
            DEFAULT_WINDOW_TIME
        }
    }
}

/// 虚拟事件定义：源 `event_json` 对象附加虚拟名称与别名
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VirtualEventDef(Map<String, Value>);

impl VirtualEventDef {
    /// 解析 `event_json`
    ///
    /// 对象必须包含字符串字段 `owner` 和 `eventName`，否则视为格式错误。
    pub fn parse(event_json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(event_json)?;
        let Value::Object(map) = value else {
            return Err(SyncError::SourceRow(
                "event_json is not a JSON object".to_string(),
            ));
        };
        for field in ["owner", "eventName"] {
            if !map.get(field).is_some_and(Value::is_string) {
                return Err(SyncError::SourceRow(format!(
                    "event_json lacks string field '{}'",
                    field
                )));
            }
        }
        Ok(Self(map))
    }

    pub fn owner(&self) -> &str {
        self.0.get("owner").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn event_name(&self) -> &str {
        self.0
            .get("eventName")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// 附加虚拟事件名称与别名，None 不写入
    pub fn with_virtual(mut self, name: Option<&str>, alias: Option<&str>) -> Self {
        if let Some(name) = name {
            self.0
                .insert("virtual_name".to_string(), Value::String(name.to_string()));
        }
        if let Some(alias) = alias {
            self.0
                .insert("virtual_alias".to_string(), Value::String(alias.to_string()));
        }
        self
    }

    /// `attrs` 数组中的属性名；字符串原样返回，其余值取其JSON文本
    ///
    /// 字段缺失时返回None，存在但不是数组时报错。
    pub fn attrs(&self) -> Result<Option<Vec<String>>> {
        match self.0.get("attrs") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Some(_) => Err(SyncError::SourceRow(
                "event_json field 'attrs' is not an array".to_string(),
            )),
        }
    }
}
