use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::cursor::Cursor;
use crate::debounce::{DebounceSignal, Debouncer};
use crate::error::SearchError;
use crate::results::ResultSet;
use crate::sequencer::{is_dispatchable, PageKind, RequestSequencer};
use crate::types::{ResultItem, SearchFilters, SearchRequest, SearchResponse};
use crate::visibility::{CacheState, Phase, Visibility};

/// 宿主界面转交给引擎的按键，其余按键引擎不关心
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// 指针按下的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Input,
    Popup,
    Item(usize),
    Outside,
}

/// 需要驱动方执行的副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Dispatch(SearchRequest),
    Open(ResultItem),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// 弹窗未显示，按键原样交还宿主
    Ignored,
    Consumed { effect: Option<Effect> },
}

/// 一次请求的结果，成功或失败都带着请求代号回来
#[derive(Debug, Clone)]
pub struct Completion {
    pub generation: u64,
    pub outcome: Result<SearchResponse, SearchError>,
}

/// 渲染用的只读快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub query: String,
    pub phase: Option<Phase>,
    pub popup_visible: bool,
    pub showing_stale: bool,
    pub items: Vec<ResultItem>,
    pub total_count: u64,
    pub has_more: bool,
    pub selected: Option<usize>,
    pub error: Option<String>,
    pub loading_more: bool,
}

/// 即时搜索引擎：所有状态只在一个逻辑线程上修改。
///
/// 输入事件（按键、指针、聚焦）、防抖到期和响应到达都通过方法调用进来，
/// 需要对外做的事情以 `Effect` 返回，由驱动方执行。
#[derive(Debug)]
pub struct Engine {
    query: String,
    filters: SearchFilters,
    limit: usize,
    debouncer: Debouncer,
    sequencer: RequestSequencer,
    results: ResultSet,
    cursor: Cursor,
    visibility: Visibility,
    error: Option<String>,
    torn_down: bool,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            query: String::new(),
            filters: config.filters.clone(),
            limit: config.page_size(),
            debouncer: Debouncer::new(config.debounce()),
            sequencer: RequestSequencer::new(),
            results: ResultSet::default(),
            cursor: Cursor::default(),
            visibility: Visibility::default(),
            error: None,
            torn_down: false,
        }
    }

    pub fn on_query_changed(&mut self, text: &str) {
        self.on_query_changed_at(text, Instant::now());
    }

    pub fn on_query_changed_at(&mut self, text: &str, now: Instant) {
        if self.torn_down || text == self.query {
            return;
        }
        self.query = text.to_string();
        self.requery(now);
    }

    /// 过滤条件变化等同于换了一个查询
    pub fn set_filters(&mut self, filters: SearchFilters) {
        self.set_filters_at(filters, Instant::now());
    }

    pub fn set_filters_at(&mut self, filters: SearchFilters, now: Instant) {
        if self.torn_down || filters == self.filters {
            return;
        }
        self.filters = filters;
        // 旧过滤条件下的缓存不再可信
        self.results.clear();
        self.cursor.reset(0);
        if !self.query.is_empty() {
            self.requery(now);
        }
    }

    fn requery(&mut self, now: Instant) {
        // 尚未返回的请求全部作废
        self.sequencer.invalidate();
        self.error = None;

        match self.debouncer.on_query_changed_at(&self.query, now) {
            DebounceSignal::Clear => self.reset(),
            DebounceSignal::Scheduled => {
                let dispatchable = is_dispatchable(&self.query);
                if !dispatchable {
                    self.results.clear();
                    self.cursor.reset(0);
                }
                self.visibility.on_input(dispatchable);
            }
        }
    }

    fn reset(&mut self) {
        self.results.clear();
        self.cursor.reset(0);
        self.visibility.clear();
        self.error = None;
    }

    /// 防抖到期时返回需要发出的请求
    pub fn poll(&mut self, now: Instant) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        let Some(text) = self.debouncer.poll(now) else {
            return Vec::new();
        };
        match self.sequencer.dispatch(&text, &self.filters, self.limit, 0) {
            Some(request) => {
                self.visibility.on_debounce_fired();
                vec![Effect::Dispatch(request)]
            }
            None => {
                debug!(query = %text, "查询过短，不发请求");
                self.reset();
                Vec::new()
            }
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// 响应到达。返回是否被采纳
    pub fn on_completion(&mut self, completion: Completion) -> bool {
        if self.torn_down {
            return false;
        }
        let Completion {
            generation,
            outcome,
        } = completion;
        let Some(kind) = self.sequencer.admit(generation) else {
            return false;
        };
        match outcome {
            Ok(response) => {
                debug!(generation, count = response.results.len(), "采纳搜索结果");
                match kind {
                    PageKind::Fresh => {
                        self.results.replace(&self.query, response, generation);
                        self.cursor.reset(self.results.len());
                    }
                    PageKind::Append => {
                        self.results.append(response, generation);
                        self.cursor.extend(self.results.len());
                    }
                }
                self.error = None;
                self.visibility.on_success();
            }
            Err(e) => {
                warn!(generation, "搜索失败: {}", e);
                // 已缓存的结果保留到下一次输入
                self.error = Some(e.user_message().to_string());
                self.visibility.on_failure();
            }
        }
        true
    }

    /// 方向键、回车、Esc 只在弹窗显示时消费
    pub fn on_key(&mut self, key: Key) -> KeyOutcome {
        if self.torn_down || !self.visibility.popup_visible() {
            return KeyOutcome::Ignored;
        }
        let effect = match key {
            Key::ArrowDown => {
                self.cursor.move_down();
                None
            }
            Key::ArrowUp => {
                self.cursor.move_up();
                None
            }
            Key::Enter => self.commit(),
            Key::Escape => {
                self.visibility.dismiss();
                None
            }
        };
        KeyOutcome::Consumed { effect }
    }

    pub fn on_pointer_down(&mut self, target: PointerTarget) -> Option<Effect> {
        if self.torn_down {
            return None;
        }
        match target {
            PointerTarget::Outside => {
                self.visibility.dismiss();
                None
            }
            PointerTarget::Item(index) => {
                if !self.visibility.popup_visible() || index >= self.results.len() {
                    return None;
                }
                self.cursor.hover(index);
                self.commit()
            }
            PointerTarget::Input | PointerTarget::Popup => None,
        }
    }

    pub fn hover(&mut self, index: usize) {
        if !self.torn_down {
            self.cursor.hover(index);
        }
    }

    /// 被关闭后重新聚焦：有当前查询的缓存就直接显示，不重新请求
    pub fn on_focus(&mut self) {
        self.on_focus_at(Instant::now());
    }

    pub fn on_focus_at(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        let cache = if self.results.is_valid_for(&self.query) {
            CacheState::Valid
        } else if self.sequencer.in_flight().is_some() {
            CacheState::InFlight
        } else {
            CacheState::Missing
        };
        if self.visibility.on_focus(!self.query.is_empty(), cache) {
            self.debouncer.on_query_changed_at(&self.query, now);
        }
    }

    /// 选中当前高亮项：打开目标位置并关闭弹窗
    pub fn commit(&mut self) -> Option<Effect> {
        if self.torn_down || !self.visibility.popup_visible() {
            return None;
        }
        let item = self.cursor.current().and_then(|i| self.results.get(i))?.clone();
        self.visibility.dismiss();
        Some(Effect::Open(item))
    }

    /// 请求下一页，只在当前结果有效且没有请求在途时生效
    pub fn load_more(&mut self) -> Option<Effect> {
        if self.torn_down
            || self.visibility.phase() != Phase::Open
            || !self.results.has_more()
            || !self.results.is_valid_for(&self.query)
            || self.sequencer.in_flight().is_some()
        {
            return None;
        }
        self.sequencer
            .dispatch_page(
                &self.query,
                &self.filters,
                self.limit,
                self.results.next_offset(),
                PageKind::Append,
            )
            .map(Effect::Dispatch)
    }

    /// 卸载：取消防抖，之后任何迟到的响应都不会再改动状态
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.debouncer.cancel();
        self.sequencer.shutdown();
        self.visibility.clear();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            query: self.query.clone(),
            phase: Some(self.visibility.phase()),
            popup_visible: self.visibility.popup_visible(),
            showing_stale: self.visibility.showing_stale(),
            items: self.results.items().to_vec(),
            total_count: self.results.total_count(),
            has_more: self.results.has_more(),
            selected: self.cursor.current(),
            error: self.error.clone(),
            loading_more: self.visibility.phase() == Phase::Open
                && self.sequencer.in_flight().is_some(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.visibility.phase()
    }

    pub fn popup_visible(&self) -> bool {
        self.visibility.popup_visible()
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn selected(&self) -> Option<usize> {
        self.cursor.current()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
