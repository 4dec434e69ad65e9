use thiserror::Error;

/// 弹窗里展示给用户的统一错误文案
pub const SEARCH_FAILED: &str = "Search failed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// 连接失败、超时等传输层错误
    #[error("请求搜索服务失败: {0}")]
    Transport(String),

    /// 服务端返回非 2xx
    #[error("搜索服务返回状态码 {0}")]
    Status(u16),

    #[error("响应解析失败: {0}")]
    Decode(String),

    /// 匹配区间越界、重叠或未排序
    #[error("匹配区间非法: {0}")]
    MalformedRanges(String),
}

impl SearchError {
    /// 对用户只暴露一种"搜索失败"状态，不解释状态码
    pub fn user_message(&self) -> &'static str {
        SEARCH_FAILED
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            SearchError::Status(status.as_u16())
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}
