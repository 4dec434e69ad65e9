use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use crate::client::{HttpSearchClient, SearchService};
use crate::config::EngineConfig;
use crate::sequencer::RequestSequencer;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "即时代码搜索", long_about = None)]
pub struct CliArgs {
    /// 单次搜索并输出 JSON（不打开窗口）
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// 索引服务地址
    #[arg(short = 'e', long = "endpoint")]
    pub endpoint: Option<String>,

    /// 防抖间隔（毫秒，250-400）
    #[arg(long = "debounce-ms")]
    pub debounce_ms: Option<u64>,

    /// 每页结果数
    #[arg(short = 'l', long = "limit")]
    pub limit: Option<usize>,

    /// 起始偏移（仅单次搜索）
    #[arg(long = "offset", default_value_t = 0)]
    pub offset: usize,

    /// 仓库过滤
    #[arg(long = "repo")]
    pub repo: Option<String>,

    /// 语言过滤
    #[arg(long = "language")]
    pub language: Option<String>,

    /// 路径过滤
    #[arg(long = "path")]
    pub path: Option<String>,

    /// 区分大小写
    #[arg(short = 'c', long = "case-sensitive")]
    pub case_sensitive: bool,

    /// 按正则搜索
    #[arg(short = 'r', long = "regex")]
    pub regex: bool,
}

impl CliArgs {
    /// 命令行参数覆盖配置文件
    pub fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
        if self.repo.is_some() {
            config.filters.repo = self.repo.clone();
        }
        if self.language.is_some() {
            config.filters.language = self.language.clone();
        }
        if self.path.is_some() {
            config.filters.path = self.path.clone();
        }
        config.filters.case_sensitive |= self.case_sensitive;
        config.filters.regex |= self.regex;
        config
    }
}

// 单次搜索入口
pub async fn run_cli(query: &str, offset: usize, config: &EngineConfig) -> Result<()> {
    let mut sequencer = RequestSequencer::new();
    let output = match sequencer.dispatch(query, &config.filters, config.page_size(), offset) {
        None => json!({
            "code": 1,
            "msg": "查询过短",
            "query": query,
        }),
        Some(request) => {
            let client = HttpSearchClient::from_config(config).context("创建 HTTP 客户端失败")?;
            match client.search(&request).await {
                Ok(response) => json!({
                    "code": 0,
                    "msg": "success",
                    "query": query,
                    "totalCount": response.total_count,
                    "hasMore": response.has_more,
                    "results": serde_json::to_value(&response.results)?,
                }),
                Err(e) => json!({
                    "code": 2,
                    "msg": e.user_message(),
                    "detail": e.to_string(),
                    "query": query,
                }),
            }
        }
    };

    // 输出 JSON，方便脚本解析
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
