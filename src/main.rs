use anyhow::Context;
use clap::Parser;
use eframe::egui;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use instantsearch::cli::{self, CliArgs};
use instantsearch::config::EngineConfig;
use instantsearch::gui::InstantSearchApp;
use instantsearch::navigator::BrowserNavigator;
use instantsearch::{HttpSearchClient, SearchService};

fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .init();

    let args = CliArgs::parse();
    let config = args.apply(EngineConfig::load()?);

    let runtime = tokio::runtime::Runtime::new().context("创建异步运行时失败")?;

    // 1. 单次搜索模式
    if let Some(query) = &args.query {
        return runtime.block_on(cli::run_cli(query, args.offset, &config));
    }

    // 2. 窗口模式
    let service: Arc<dyn SearchService> =
        Arc::new(HttpSearchClient::from_config(&config).context("创建 HTTP 客户端失败")?);
    let navigator = Arc::new(BrowserNavigator::new(config.endpoint.clone()));
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("即时代码搜索")
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "instantsearch",
        options,
        Box::new(move |cc| {
            Ok(Box::new(InstantSearchApp::new(
                cc, &config, service, navigator, handle,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI 运行失败: {}", e))?;

    // 运行时需要活到窗口关闭之后
    drop(runtime);
    Ok(())
}
