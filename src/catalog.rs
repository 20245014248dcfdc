//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 同步单元目录
//!
//! 每个单元对应一个逻辑缓存名称，声明其数据形态、所属分组以及数据生产函数。

use crate::dataset::{Dataset, Shape};
use crate::error::{Result, SyncError};
use crate::extract::Extractor;
use futures::future::BoxFuture;
use futures::FutureExt;

/// 逻辑缓存名称
pub mod names {
    pub const APP_KEY_APP_ID_MAP: &str = "appKeyAppIdMap";
    pub const APP_ID_SDK_HAS_DATA_MAP: &str = "appIdSdkHasDataMap";
    pub const APP_ID_PROP_ID_MAP: &str = "appIdPropIdMap";
    pub const APP_ID_PROP_ID_ORIGINAL_MAP: &str = "appIdPropIdOriginalMap";
    pub const APP_ID_EVENT_ID_MAP: &str = "appIdEventIdMap";
    pub const APP_ID_EVENT_ATTR_ID_MAP: &str = "appIdEventAttrIdMap";
    pub const APP_ID_DEVICE_PROP_ID_MAP: &str = "appIdDevicePropIdMap";

    pub const BLACK_USER_PROP_SET: &str = "blackUserPropSet";
    pub const BLACK_EVENT_ID_SET: &str = "blackEventIdSet";
    pub const BLACK_EVENT_ATTR_ID_SET: &str = "blackEventAttrIdSet";
    pub const APP_ID_CREATE_EVENT_FORBID_SET: &str = "appIdCreateEventForbidSet";
    pub const APP_ID_UPLOAD_DATA_SET: &str = "appIdUploadDataSet";
    pub const APP_ID_NONE_AUTO_CREATE_SET: &str = "appIdNoneAutoCreateSet";
    pub const EVENT_ID_CREATE_ATTR_FORBIDDEN_SET: &str = "eventIdCreateAttrForbiddenSet";
    pub const EVENT_ID_PLATFORM: &str = "eventIdPlatform";
    pub const EVENT_ATTR_PLATFORM: &str = "eventAttrdPlatform";
    pub const DEVICE_PROP_PLATFORM: &str = "devicePropPlatform";

    pub const VIRTUAL_EVENT_MAP: &str = "virtualEventMap";
    pub const VIRTUAL_EVENT_ATTR_MAP: &str = "virtualEventAttrMap";
    pub const EVENT_ATTR_ALIAS_MAP: &str = "eventAttrAliasMap";
    pub const VIRTUAL_EVENT_APPIDS_SET: &str = "virtualEventAppidsSet";
    pub const VIRTUAL_PROP_APP_IDS_SET: &str = "virtualPropAppIdsSet";
    pub const EVENT_VIRTUAL_ATTR_IDS_SET: &str = "eventVirtualAttrIdsSet";
    pub const VIRTUAL_EVENT_PROP_MAP: &str = "virtualEventPropMap";
    pub const VIRTUAL_USER_PROP_MAP: &str = "virtualUserPropMap";

    pub const OPEN_ADVERTISING_FUNCTION_APP_MAP: &str = "openAdvertisingFunctionAppMap";
    pub const LID_AND_CHANNEL_EVENT_MAP: &str = "lidAndChannelEventMap";
    pub const APP_ID_S_MAP: &str = "appIdSMap";
    pub const AD_FREQUENCY_SET: &str = "adFrequencySet";
    pub const ADS_LINK_EVENT_MAP: &str = "adsLinkEventMap";

    pub const EVENT_ATTR_COLUMN_MAP: &str = "eventAttrColumnMap";
    pub const BASE_CURRENT_MAP: &str = "baseCurrentMap";
    pub const OPEN_CDP_APPID_MAP: &str = "openCdpAppidMap";
    pub const YEAR_WEEK: &str = "yearweek";
    pub const CID_BY_AID_MAP: &str = "cidByAidMap";
    pub const BUSINESS_MAP: &str = "businessMap";
}

/// 单元分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGroup {
    Core,
    /// 受 `sync.enable_advertising` 控制
    Advertising,
}

/// 数据生产函数
pub type Producer = for<'a> fn(&'a Extractor) -> BoxFuture<'a, Result<Dataset>>;

/// 同步单元
#[derive(Clone, Copy)]
pub struct SyncUnit {
    pub name: &'static str,
    pub shape: Shape,
    pub group: UnitGroup,
    pub producer: Producer,
}

impl std::fmt::Debug for SyncUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncUnit")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("group", &self.group)
            .finish()
    }
}

impl SyncUnit {
    pub const fn new(name: &'static str, shape: Shape, group: UnitGroup, producer: Producer) -> Self {
        Self {
            name,
            shape,
            group,
            producer,
        }
    }

    /// 运行生产函数，并校验数据集形态与声明一致
    pub async fn produce(&self, extractor: &Extractor) -> Result<Dataset> {
        let dataset = (self.producer)(extractor).await?;
        if dataset.shape() != self.shape {
            return Err(SyncError::Store(format!(
                "{} produced a {} dataset, expected {}",
                self.name,
                dataset.shape(),
                self.shape
            )));
        }
        Ok(dataset)
    }
}

/// 完整目录，按固定顺序排列
pub fn all_units() -> Vec<SyncUnit> {
    use names::*;
    use Shape::{Hash, Set};
    use UnitGroup::{Advertising, Core};

    vec![
        SyncUnit::new(APP_KEY_APP_ID_MAP, Hash, Core, app_key_app_id),
        SyncUnit::new(APP_ID_SDK_HAS_DATA_MAP, Hash, Core, sdk_has_data),
        SyncUnit::new(APP_ID_PROP_ID_MAP, Hash, Core, prop_id),
        SyncUnit::new(APP_ID_PROP_ID_ORIGINAL_MAP, Hash, Core, prop_id_original),
        SyncUnit::new(APP_ID_EVENT_ID_MAP, Hash, Core, event_id),
        SyncUnit::new(APP_ID_EVENT_ATTR_ID_MAP, Hash, Core, event_attr_id),
        SyncUnit::new(APP_ID_DEVICE_PROP_ID_MAP, Hash, Core, device_prop_id),
        SyncUnit::new(BLACK_USER_PROP_SET, Set, Core, black_user_props),
        SyncUnit::new(BLACK_EVENT_ID_SET, Set, Core, black_events),
        SyncUnit::new(BLACK_EVENT_ATTR_ID_SET, Set, Core, black_event_attrs),
        SyncUnit::new(APP_ID_CREATE_EVENT_FORBID_SET, Set, Core, create_event_forbidden),
        SyncUnit::new(APP_ID_UPLOAD_DATA_SET, Set, Core, upload_data),
        SyncUnit::new(APP_ID_NONE_AUTO_CREATE_SET, Set, Core, none_auto_create),
        SyncUnit::new(EVENT_ID_CREATE_ATTR_FORBIDDEN_SET, Set, Core, create_attr_forbidden),
        SyncUnit::new(EVENT_ID_PLATFORM, Set, Core, event_platforms),
        SyncUnit::new(EVENT_ATTR_PLATFORM, Set, Core, event_attr_platforms),
        SyncUnit::new(DEVICE_PROP_PLATFORM, Set, Core, device_prop_platforms),
        SyncUnit::new(VIRTUAL_EVENT_MAP, Hash, Core, virtual_events),
        SyncUnit::new(VIRTUAL_EVENT_ATTR_MAP, Hash, Core, virtual_event_attrs),
        SyncUnit::new(EVENT_ATTR_ALIAS_MAP, Hash, Core, event_attr_alias),
        SyncUnit::new(VIRTUAL_EVENT_APPIDS_SET, Set, Core, virtual_event_app_ids),
        SyncUnit::new(VIRTUAL_PROP_APP_IDS_SET, Set, Core, virtual_prop_app_ids),
        SyncUnit::new(EVENT_VIRTUAL_ATTR_IDS_SET, Set, Core, virtual_attr_ids),
        SyncUnit::new(VIRTUAL_EVENT_PROP_MAP, Hash, Core, virtual_event_props),
        SyncUnit::new(VIRTUAL_USER_PROP_MAP, Hash, Core, virtual_user_props),
        SyncUnit::new(OPEN_ADVERTISING_FUNCTION_APP_MAP, Hash, Advertising, advertising_apps),
        SyncUnit::new(LID_AND_CHANNEL_EVENT_MAP, Hash, Advertising, link_channel_events),
        SyncUnit::new(APP_ID_S_MAP, Hash, Advertising, link_event_ids),
        SyncUnit::new(AD_FREQUENCY_SET, Set, Advertising, ad_frequency),
        SyncUnit::new(ADS_LINK_EVENT_MAP, Hash, Advertising, ads_link_events),
        SyncUnit::new(EVENT_ATTR_COLUMN_MAP, Hash, Core, attr_columns),
        SyncUnit::new(BASE_CURRENT_MAP, Hash, Core, kudu_tables),
        SyncUnit::new(OPEN_CDP_APPID_MAP, Hash, Core, open_cdp),
        SyncUnit::new(YEAR_WEEK, Hash, Core, year_week),
        SyncUnit::new(CID_BY_AID_MAP, Hash, Core, cid_by_aid),
        SyncUnit::new(BUSINESS_MAP, Set, Core, business),
    ]
}

/// 本周期启用的单元
pub fn enabled_units(enable_advertising: bool) -> Vec<SyncUnit> {
    filter_enabled(&all_units(), enable_advertising)
}

/// 按广告开关筛选单元，保持原有顺序
pub fn filter_enabled(units: &[SyncUnit], enable_advertising: bool) -> Vec<SyncUnit> {
    units
        .iter()
        .filter(|u| enable_advertising || u.group != UnitGroup::Advertising)
        .copied()
        .collect()
}

fn app_key_app_id(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(&ex.company_app().await?.app_key_app_id)) }.boxed()
}

fn sdk_has_data(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(ex.sdk_has_data().await?)) }.boxed()
}

fn prop_id(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(&ex.user_props().await?.prop_id)) }.boxed()
}

fn prop_id_original(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(&ex.user_props().await?.prop_id_original)) }.boxed()
}

fn event_id(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(&ex.events().await?.event_id)) }.boxed()
}

fn event_attr_id(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(&ex.event_attrs().await?.attr_id)) }.boxed()
}

fn device_prop_id(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(ex.device_prop_ids().await?)) }.boxed()
}

fn black_user_props(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(&ex.user_props().await?.black_props)) }.boxed()
}

fn black_events(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(&ex.events().await?.black_events)) }.boxed()
}

fn black_event_attrs(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(&ex.event_attrs().await?.black_attrs)) }.boxed()
}

fn create_event_forbidden(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(ex.forbidden_create_event_app_ids().await?)) }.boxed()
}

fn upload_data(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(ex.upload_data_app_ids().await?)) }.boxed()
}

fn none_auto_create(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(&ex.company_app().await?.none_auto_create)) }.boxed()
}

fn create_attr_forbidden(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::set(ex.forbidden_create_attr_event_ids().await?)) }.boxed()
}

fn event_platforms(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.event_platforms().await?)) }.boxed()
}

fn event_attr_platforms(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.event_attr_platforms().await?)) }.boxed()
}

fn device_prop_platforms(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.device_prop_platforms().await?)) }.boxed()
}

fn virtual_events(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Dataset::json_lists(&ex.virtual_events().await?) }.boxed()
}

fn virtual_event_attrs(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Dataset::json_values(&ex.virtual_event_attrs().await?) }.boxed()
}

fn event_attr_alias(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.event_attrs().await?.attr_alias.clone())) }.boxed()
}

fn virtual_event_app_ids(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.virtual_event_app_ids().await?)) }.boxed()
}

fn virtual_prop_app_ids(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.virtual_prop_app_ids().await?)) }.boxed()
}

fn virtual_attr_ids(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.event_attrs().await?.virtual_attr_ids.clone())) }.boxed()
}

fn virtual_event_props(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Dataset::json_lists(&ex.event_attrs().await?.virtual_event_props) }.boxed()
}

fn virtual_user_props(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Dataset::json_lists(&ex.user_props().await?.virtual_props) }.boxed()
}

fn advertising_apps(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(ex.advertising_apps().await?)) }.boxed()
}

fn link_channel_events(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.link_channel_events().await?)) }.boxed()
}

fn link_event_ids(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::hash(ex.link_event_ids().await?)) }.boxed()
}

fn ad_frequency(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.ad_frequency().await?)) }.boxed()
}

fn ads_link_events(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Dataset::json_values(&ex.ads_link_events().await?) }.boxed()
}

fn attr_columns(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.event_attrs().await?.attr_column.clone())) }.boxed()
}

fn kudu_tables(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.kudu_tables().await?)) }.boxed()
}

fn open_cdp(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.open_cdp().await?)) }.boxed()
}

fn year_week(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.year_week().await?)) }.boxed()
}

fn cid_by_aid(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Hash(ex.company_app().await?.cid_by_aid.clone())) }.boxed()
}

fn business(ex: &Extractor) -> BoxFuture<'_, Result<Dataset>> {
    async move { Ok(Dataset::Set(ex.business().await?)) }.boxed()
}
