use serde::{Deserialize, Serialize};

/// 匹配区间：行内字符偏移 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

impl MatchRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<[usize; 2]> for MatchRange {
    fn from([start, end]: [usize; 2]) -> Self {
        Self { start, end }
    }
}

impl From<MatchRange> for [usize; 2] {
    fn from(range: MatchRange) -> Self {
        [range.start, range.end]
    }
}

/// 单条匹配行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub repo: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub line: String,
    /// 从 1 开始
    pub line_number: u32,
    #[serde(default)]
    pub match_ranges: Vec<MatchRange>,
}

impl ResultItem {
    /// 文件名（路径最后一段）
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// 搜索过滤条件，由调用方提供，每次请求内不可变
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub regex: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub limit: usize,
    pub offset: usize,
    pub generation: u64,
}

impl SearchRequest {
    /// 查询参数，只带非空的过滤项
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("q", self.query.clone()),
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        let optional = [
            ("repo", &self.filters.repo),
            ("language", &self.filters.language),
            ("path", &self.filters.path),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }
        if self.filters.case_sensitive {
            pairs.push(("case", "1".to_string()));
        }
        if self.filters.regex {
            pairs.push(("regex", "1".to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ResultItem>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
}

/// 索引服务的两种响应格式：分页对象，或旧版直接返回的数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireResponse {
    Page(SearchResponse),
    Bare(Vec<ResultItem>),
}

impl From<WireResponse> for SearchResponse {
    fn from(wire: WireResponse) -> Self {
        match wire {
            WireResponse::Page(page) => page,
            WireResponse::Bare(results) => SearchResponse {
                total_count: results.len() as u64,
                has_more: false,
                results,
            },
        }
    }
}
