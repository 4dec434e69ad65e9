use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::SearchFilters;

/// 输入静止多久后才发起搜索
pub const DEBOUNCE_MS: u64 = 300;

/// 防抖间隔允许的范围
pub const DEBOUNCE_RANGE_MS: (u64, u64) = (250, 400);

/// 少于该字符数的查询不会发出请求
pub const MIN_QUERY_LEN: usize = 3;

/// 每页结果数
pub const DEFAULT_LIMIT: usize = 20;

/// 本地索引服务地址
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// 请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub endpoint: String,
    pub debounce_ms: u64,
    pub limit: usize,
    pub timeout_secs: u64,
    pub filters: SearchFilters,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debounce_ms: DEBOUNCE_MS,
            limit: DEFAULT_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            filters: SearchFilters::default(),
        }
    }
}

impl EngineConfig {
    /// 防抖间隔，超出范围的配置会被夹到边界
    pub fn debounce(&self) -> Duration {
        let (lo, hi) = DEBOUNCE_RANGE_MS;
        Duration::from_millis(self.debounce_ms.clamp(lo, hi))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn page_size(&self) -> usize {
        self.limit.max(1)
    }

    /// 读取配置文件；文件不存在时返回默认值
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("配置文件格式错误: {}", path.display()))?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }
}

/// 数据保存目录
pub fn data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("InstantSearch");
    p
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
