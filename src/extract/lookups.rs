//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 无法合并的独立查找，每次调用执行一次查询，不做记忆化。

use super::queries;
use super::records::{AdsLinkEvent, VirtualEventDef};
use super::Extractor;
use crate::error::Result;
use crate::source::{Query, Row};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

impl Extractor {
    async fn rows(&self, query: &Query) -> Result<Vec<Row>> {
        self.source().fetch(query).await
    }

    /// `{main_id}_{sdk_platform}` → has_data
    pub async fn sdk_has_data(&self) -> Result<HashMap<String, i64>> {
        let rows = self.rows(&queries::SDK_HAS_DATA).await?;
        Ok(rows
            .iter()
            .map(|r| {
                (
                    format!("{}_{}", r.int("main_id"), r.int("sdk_platform")),
                    r.int("has_data"),
                )
            })
            .collect())
    }

    /// `{app_id}_{owner}_{name}` → 设备属性id
    pub async fn device_prop_ids(&self) -> Result<HashMap<String, i64>> {
        let rows = self.rows(&queries::DEVICE_PROP).await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                let name = r.text("name")?;
                Some((
                    format!("{}_{}_{}", r.int("app_id"), r.text_or_null("owner"), name),
                    r.int("id"),
                ))
            })
            .collect())
    }

    /// 事件数量已达配额的应用
    pub async fn forbidden_create_event_app_ids(&self) -> Result<HashSet<i64>> {
        self.int_set(&queries::EVENT_QUOTA_REACHED, "id").await
    }

    /// 属性数量已达配额的事件
    pub async fn forbidden_create_attr_event_ids(&self) -> Result<HashSet<i64>> {
        self.int_set(&queries::ATTR_QUOTA_REACHED, "id").await
    }

    /// 已上传过数据的应用
    pub async fn upload_data_app_ids(&self) -> Result<HashSet<i64>> {
        self.int_set(&queries::UPLOAD_DATA, "app_id").await
    }

    /// `{event_id}_{platform}`
    pub async fn event_platforms(&self) -> Result<HashSet<String>> {
        self.pair_set(&queries::EVENT_PLATFORM, "event_id", "platform")
            .await
    }

    /// `{event_attr_id}_{platform}`
    pub async fn event_attr_platforms(&self) -> Result<HashSet<String>> {
        self.pair_set(&queries::EVENT_ATTR_PLATFORM, "event_attr_id", "platform")
            .await
    }

    /// `{prop_id}_{platform}`
    pub async fn device_prop_platforms(&self) -> Result<HashSet<String>> {
        self.pair_set(&queries::DEVICE_PROP_PLATFORM, "prop_id", "platform")
            .await
    }

    /// 开通投放功能的应用：app_key → 应用id
    pub async fn advertising_apps(&self) -> Result<HashMap<String, i64>> {
        let rows = self.rows(&queries::ADVERTISING_APP).await?;
        Ok(rows
            .iter()
            .filter_map(|r| Some((r.text("app_key")?.to_string(), r.int("app_id"))))
            .collect())
    }

    /// `{link_id}_{event_id}` → 渠道事件，渠道事件为空的行跳过
    pub async fn link_channel_events(&self) -> Result<HashMap<String, String>> {
        let rows = self.rows(&queries::ADS_LINK_CHANNEL).await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some((
                    format!("{}_{}", r.int("link_id"), r.int("event_id")),
                    r.text("channel_event")?.to_string(),
                ))
            })
            .collect())
    }

    /// 链接id → 事件id
    pub async fn link_event_ids(&self) -> Result<HashMap<i64, i64>> {
        let rows = self.rows(&queries::ADS_LINK_EVENT_ID).await?;
        Ok(rows
            .iter()
            .map(|r| (r.int("link_id"), r.int("event_id")))
            .collect())
    }

    /// `{event_id}_{link_id}_{zg_id}`
    pub async fn ad_frequency(&self) -> Result<HashSet<String>> {
        let rows = self.rows(&queries::ADS_FREQUENCY).await?;
        Ok(rows
            .iter()
            .map(|r| {
                format!(
                    "{}_{}_{}",
                    r.int("event_id"),
                    r.int("link_id"),
                    r.text_or_null("zg_id")
                )
            })
            .collect())
    }

    /// `{event_id}_{link_id}` → 投放链接事件
    pub async fn ads_link_events(&self) -> Result<HashMap<String, AdsLinkEvent>> {
        let rows = self.rows(&queries::ADS_LINK_EVENT).await?;
        Ok(rows
            .iter()
            .map(|r| {
                let event = AdsLinkEvent {
                    channel_event: r.text("channel_event").map(str::to_string),
                    event_id: r.int("event_id"),
                    event_ids: r.text("event_ids").map(str::to_string),
                    frequency: r.int("frequency"),
                    link_id: r.int("link_id"),
                    match_json: r.text("match_json").map(str::to_string),
                    window_time: AdsLinkEvent::normalize_window(r.int("windows_time")),
                };
                (format!("{}_{}", event.event_id, event.link_id), event)
            })
            .collect())
    }

    /// `{app_id}_{owner}_{eventName}` → 虚拟事件定义列表
    pub async fn virtual_events(&self) -> Result<HashMap<String, Vec<VirtualEventDef>>> {
        let rows = self.rows(&queries::VIRTUAL_EVENT).await?;
        let mut result: HashMap<String, Vec<VirtualEventDef>> = HashMap::new();
        for row in &rows {
            let Some(def) = parse_event_json(row) else {
                continue;
            };
            let def = def.with_virtual(row.text("event_name"), row.text("alias_name"));
            let key = format!("{}_{}_{}", row.int("app_id"), def.owner(), def.event_name());
            result.entry(key).or_default().push(def);
        }
        Ok(result)
    }

    /// `{app_id}_{virtual_name}_{owner}_{eventName}` → 有序属性集合
    pub async fn virtual_event_attrs(&self) -> Result<HashMap<String, BTreeSet<String>>> {
        let rows = self.rows(&queries::VIRTUAL_EVENT).await?;
        let mut result: HashMap<String, BTreeSet<String>> = HashMap::new();
        for row in &rows {
            let Some(def) = parse_event_json(row) else {
                continue;
            };
            let attrs = match def.attrs() {
                Ok(Some(attrs)) => attrs,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping virtual event attrs: {}", e);
                    continue;
                }
            };
            let key = format!(
                "{}_{}_{}_{}",
                row.int("app_id"),
                row.text_or_null("event_name"),
                def.owner(),
                def.event_name()
            );
            result.entry(key).or_default().extend(attrs);
        }
        Ok(result)
    }

    /// 拥有虚拟事件的应用
    pub async fn virtual_event_app_ids(&self) -> Result<HashSet<String>> {
        let rows = self.rows(&queries::VIRTUAL_EVENT_APP).await?;
        Ok(rows.iter().map(|r| r.int("app_id").to_string()).collect())
    }

    /// 拥有虚拟属性的应用，合并用户属性与事件属性两个视图
    pub async fn virtual_prop_app_ids(&self) -> Result<HashSet<String>> {
        let props = self.user_props().await?;
        let attrs = self.event_attrs().await?;
        Ok(props
            .virtual_prop_app_ids
            .union(&attrs.virtual_prop_app_ids)
            .cloned()
            .collect())
    }

    /// 基础表名 → 当前表名
    pub async fn kudu_tables(&self) -> Result<HashMap<String, String>> {
        let rows = self.rows(&queries::KUDU_EXCHANGE).await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some((
                    r.text("base_name")?.to_string(),
                    r.text("current_name")?.to_string(),
                ))
            })
            .collect())
    }

    /// 开启 id_mapping 的有效应用：`{app_id}` → 配置值
    pub async fn open_cdp(&self) -> Result<HashMap<String, String>> {
        let apps = self.company_app().await?;
        let rows = self.rows(&queries::OPEN_CDP).await?;
        Ok(rows
            .iter()
            .filter(|r| apps.valid_app_ids.contains(&r.int("app_id")))
            .filter_map(|r| Some((r.int("app_id").to_string(), r.text("app_config")?.to_string())))
            .collect())
    }

    /// `{day}` → `{year_week}`
    pub async fn year_week(&self) -> Result<HashMap<String, String>> {
        let rows = self.rows(&queries::YEAR_WEEK).await?;
        Ok(rows
            .iter()
            .map(|r| (r.int("day").to_string(), r.int("year_week").to_string()))
            .collect())
    }

    /// `{company_id}_{identifier}`
    pub async fn business(&self) -> Result<HashSet<String>> {
        let rows = self.rows(&queries::BUSINESS).await?;
        Ok(rows
            .iter()
            .map(|r| format!("{}_{}", r.int("company_id"), r.text_or_null("identifier")))
            .collect())
    }

    async fn int_set(&self, query: &Query, column: &str) -> Result<HashSet<i64>> {
        let rows = self.rows(query).await?;
        Ok(rows.iter().map(|r| r.int(column)).collect())
    }

    async fn pair_set(
        &self,
        query: &Query,
        left: &str,
        right: &str,
    ) -> Result<HashSet<String>> {
        let rows = self.rows(query).await?;
        Ok(rows
            .iter()
            .map(|r| format!("{}_{}", r.int(left), r.int(right)))
            .collect())
    }
}

fn parse_event_json(row: &Row) -> Option<VirtualEventDef> {
    let json = row.text("event_json")?;
    match VirtualEventDef::parse(json) {
        Ok(def) => Some(def),
        Err(e) => {
            warn!("Parse virtual event json failed: {}: {}", json, e);
            None
        }
    }
}
