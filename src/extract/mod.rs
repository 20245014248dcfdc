//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 合并提取层
//!
//! 共享同一物理查询的多个查找被合并为一次扫描，扫描结果在一个同步周期内
//! 记忆化，并派生出多个视图。每个视图使用单飞（single-flight）初始化：
//! 第一个调用者执行扫描，并发调用者等待同一次初始化完成。

mod lookups;
pub mod queries;
pub mod records;
pub mod views;

use crate::error::{Result, SyncError};
use crate::source::SourceReader;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub use records::{AdsLinkEvent, VirtualAttrDef, VirtualEventDef, VirtualPropDef};
pub use views::{CompanyAppView, EventAttrView, EventInfo, EventView, UserPropView};

/// 一个周期内的视图单元格
#[derive(Default)]
struct ViewCells {
    company_app: OnceCell<Arc<CompanyAppView>>,
    user_props: OnceCell<Arc<UserPropView>>,
    events: OnceCell<Arc<EventView>>,
    event_attrs: OnceCell<Arc<EventAttrView>>,
}

/// 合并提取器
pub struct Extractor {
    source: Arc<dyn SourceReader>,
    generation: Mutex<Arc<ViewCells>>,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new(source: Arc<dyn SourceReader>) -> Self {
        Self {
            source,
            generation: Mutex::new(Arc::new(ViewCells::default())),
        }
    }

    pub fn source(&self) -> &Arc<dyn SourceReader> {
        &self.source
    }

    /// 丢弃所有已物化的视图
    ///
    /// 每个周期开始、任何单元运行之前调用一次。已经持有旧视图的调用者不受影响。
    pub fn reset(&self) {
        let mut guard = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(ViewCells::default());
        debug!("Consolidated views cleared");
    }

    fn cells(&self) -> Arc<ViewCells> {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 应用维度视图
    pub async fn company_app(&self) -> Result<Arc<CompanyAppView>> {
        let cells = self.cells();
        self.company_app_in(&cells).await
    }

    /// 用户属性视图
    pub async fn user_props(&self) -> Result<Arc<UserPropView>> {
        let cells = self.cells();
        cells
            .user_props
            .get_or_try_init(|| async {
                let rows = self.source.fetch(&queries::USER_PROP_META).await?;
                let view = UserPropView::from_rows(&rows);
                info!(
                    "Loaded user_prop_meta: prop_id={}, black_props={}, virtual_props={}",
                    view.prop_id.len(),
                    view.black_props.len(),
                    view.virtual_props.len()
                );
                Ok::<_, SyncError>(Arc::new(view))
            })
            .await
            .cloned()
    }

    /// 事件视图
    pub async fn events(&self) -> Result<Arc<EventView>> {
        let cells = self.cells();
        self.events_in(&cells).await
    }

    /// 事件属性视图
    ///
    /// 依赖同一周期的事件视图与应用视图。
    pub async fn event_attrs(&self) -> Result<Arc<EventAttrView>> {
        let cells = self.cells();
        cells
            .event_attrs
            .get_or_try_init(|| async {
                let events = self.events_in(&cells).await?;
                let apps = self.company_app_in(&cells).await?;
                let rows = self.source.fetch(&queries::EVENT_ATTR).await?;
                let view = EventAttrView::from_rows(&events, &apps, &rows);
                info!(
                    "Loaded event_attr: attr_id={}, black_attrs={}, attr_column={}, virtual_event_props={}",
                    view.attr_id.len(),
                    view.black_attrs.len(),
                    view.attr_column.len(),
                    view.virtual_event_props.len()
                );
                Ok::<_, SyncError>(Arc::new(view))
            })
            .await
            .cloned()
    }

    async fn company_app_in(&self, cells: &ViewCells) -> Result<Arc<CompanyAppView>> {
        cells
            .company_app
            .get_or_try_init(|| async {
                let transferred = self.source.fetch(&queries::TRANSFERRED_APPS).await?;
                let rows = self.source.fetch(&queries::COMPANY_APP).await?;
                let view = CompanyAppView::from_rows(&transferred, &rows);
                info!(
                    "Loaded company_app: app_key_app_id={}, cid_by_aid={}, none_auto_create={}",
                    view.app_key_app_id.len(),
                    view.cid_by_aid.len(),
                    view.none_auto_create.len()
                );
                Ok::<_, SyncError>(Arc::new(view))
            })
            .await
            .cloned()
    }

    async fn events_in(&self, cells: &ViewCells) -> Result<Arc<EventView>> {
        cells
            .events
            .get_or_try_init(|| async {
                let rows = self.source.fetch(&queries::EVENT).await?;
                let view = EventView::from_rows(&rows);
                info!(
                    "Loaded event: event_id={}, black_events={}",
                    view.event_id.len(),
                    view.black_events.len()
                );
                Ok::<_, SyncError>(Arc::new(view))
            })
            .await
            .cloned()
    }
}
