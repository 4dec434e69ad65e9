use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::types::{SearchRequest, SearchResponse, WireResponse};

/// 远程搜索索引。排序、匹配区间的计算都在服务端
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}

/// 通过 HTTP `GET /search` 访问索引服务
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    search_url: String,
}

impl HttpSearchClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        Ok(Self::with_client(http, endpoint))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, SearchError> {
        Self::new(&config.endpoint, config.timeout())
    }

    pub fn with_client(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            search_url: format!("{}/search", endpoint.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl SearchService for HttpSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let started = std::time::Instant::now();
        let resp = self
            .http
            .get(&self.search_url)
            .query(&request.query_pairs())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        // 旧服务端没有结果时返回 null
        let wire: Option<WireResponse> =
            serde_json::from_slice(&body).map_err(|e| SearchError::Decode(e.to_string()))?;
        let response = wire.map(SearchResponse::from).unwrap_or_default();
        debug!(
            generation = request.generation,
            count = response.results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "搜索服务已响应"
        );
        Ok(response)
    }
}
