use anyhow::Result;
use tracing::{info, warn};

use crate::types::ResultItem;

/// 选中结果后的跳转动作
pub trait Navigator: Send + Sync {
    fn open(&self, item: &ResultItem) -> Result<()>;
}

/// 在浏览器中打开 `#file=<path>&line=<n>` 位置
#[derive(Debug, Clone)]
pub struct BrowserNavigator {
    base_url: String,
}

impl BrowserNavigator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn location(&self, item: &ResultItem) -> String {
        location_url(&self.base_url, item)
    }
}

pub fn location_url(base_url: &str, item: &ResultItem) -> String {
    format!(
        "{}#file={}&line={}",
        base_url.trim_end_matches('#'),
        urlencoding::encode(&item.path),
        item.line_number
    )
}

impl Navigator for BrowserNavigator {
    fn open(&self, item: &ResultItem) -> Result<()> {
        let url = self.location(item);
        info!("打开结果: {}", url);
        // 异步启动，避免阻塞界面
        std::thread::spawn(move || {
            if let Err(e) = open::that(&url) {
                warn!("打开 {} 失败: {}", url, e);
            }
        });
        Ok(())
    }
}
