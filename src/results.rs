use crate::types::{ResultItem, SearchResponse};

/// 当前查询的结果集及分页信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    query: String,
    items: Vec<ResultItem>,
    total_count: u64,
    has_more: bool,
    /// 最后一次写入该结果集的请求代号，0 表示空
    generation: u64,
}

impl ResultSet {
    /// 新查询的第一页，结果集身份改变
    pub fn replace(&mut self, query: &str, response: SearchResponse, generation: u64) {
        self.query = query.to_string();
        self.items = response.results;
        self.total_count = response.total_count;
        self.has_more = response.has_more;
        self.generation = generation;
    }

    /// 加载更多：追加到末尾，身份不变
    pub fn append(&mut self, response: SearchResponse, generation: u64) {
        self.items.extend(response.results);
        self.total_count = response.total_count.max(self.items.len() as u64);
        self.has_more = response.has_more;
        self.generation = generation;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// 缓存是否正好对应当前查询
    pub fn is_valid_for(&self, query: &str) -> bool {
        self.generation != 0 && self.query == query
    }

    pub fn next_offset(&self) -> usize {
        self.items.len()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ResultItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
