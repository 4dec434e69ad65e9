use tracing::debug;

use crate::config::MIN_QUERY_LEN;
use crate::types::{SearchFilters, SearchRequest};

/// 一次请求是新查询的第一页，还是"加载更多"的后续页
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Fresh,
    Append,
}

/// 查询是否够长，按字符数而不是字节数计算
pub fn is_dispatchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LEN
}

/// 给每次请求分配递增的代号，只放行最新一次请求的结果。
///
/// 输入还在继续时旧请求可能很晚才返回，必须丢弃，
/// 否则会覆盖掉后面那次按键已经拿到的结果。
#[derive(Debug, Default)]
pub struct RequestSequencer {
    last_issued: u64,
    outstanding: Option<(u64, PageKind)>,
    shut_down: bool,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询过短时不发请求，也不消耗代号
    pub fn dispatch(
        &mut self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
    ) -> Option<SearchRequest> {
        self.dispatch_page(query, filters, limit, offset, PageKind::Fresh)
    }

    pub fn dispatch_page(
        &mut self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
        kind: PageKind,
    ) -> Option<SearchRequest> {
        if self.shut_down || !is_dispatchable(query) {
            return None;
        }
        self.last_issued += 1;
        let generation = self.last_issued;
        self.outstanding = Some((generation, kind));
        debug!(generation, query, offset, "发起搜索请求");
        Some(SearchRequest {
            query: query.to_string(),
            filters: filters.clone(),
            limit,
            offset,
            generation,
        })
    }

    /// 只有最新的请求能被采纳，且只采纳一次
    pub fn admit(&mut self, generation: u64) -> Option<PageKind> {
        match self.outstanding {
            Some((latest, kind)) if latest == generation && !self.shut_down => {
                self.outstanding = None;
                Some(kind)
            }
            _ => {
                debug!(generation, latest = ?self.outstanding, "丢弃过期响应");
                None
            }
        }
    }

    /// 查询变化后，尚未返回的请求一律作废
    pub fn invalidate(&mut self) {
        self.outstanding = None;
    }

    pub fn shutdown(&mut self) {
        self.outstanding = None;
        self.shut_down = true;
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.outstanding.map(|(g, _)| g)
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }
}
