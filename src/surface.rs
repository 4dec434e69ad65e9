use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use crate::client::SearchService;
use crate::config::EngineConfig;
use crate::engine::{Completion, Effect, Engine, EngineSnapshot, Key, KeyOutcome, PointerTarget};
use crate::navigator::Navigator;
use crate::types::{SearchFilters, SearchRequest};

/// 宿主界面发给搜索面板的事件
#[derive(Debug)]
pub enum UiEvent {
    QueryChanged(String),
    FiltersChanged(SearchFilters),
    Key(Key, oneshot::Sender<bool>),
    PointerDown(PointerTarget),
    Hover(usize),
    Focus,
    LoadMore,
    Unmount,
}

/// 一个挂载中的搜索面板。
///
/// 引擎只归后台的一个任务所有；句柄被丢弃或调用 `unmount` 后任务退出，
/// 之后返回的响应会因为通道关闭被直接丢掉。
pub struct SurfaceHandle {
    events: mpsc::UnboundedSender<UiEvent>,
    snapshots: watch::Receiver<EngineSnapshot>,
    task: Option<JoinHandle<()>>,
}

pub struct SearchSurface;

impl SearchSurface {
    pub fn mount(
        config: &EngineConfig,
        service: Arc<dyn SearchService>,
        navigator: Arc<dyn Navigator>,
    ) -> SurfaceHandle {
        let engine = Engine::new(config);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let task = tokio::spawn(run_surface(
            engine,
            service,
            navigator,
            events_rx,
            snapshot_tx,
        ));
        info!("搜索面板已挂载");
        SurfaceHandle {
            events: events_tx,
            snapshots: snapshot_rx,
            task: Some(task),
        }
    }
}

impl SurfaceHandle {
    pub fn query_changed(&self, text: impl Into<String>) {
        self.send(UiEvent::QueryChanged(text.into()));
    }

    pub fn set_filters(&self, filters: SearchFilters) {
        self.send(UiEvent::FiltersChanged(filters));
    }

    /// 返回按键是否被面板消费；未消费的按键由宿主自行处理
    pub async fn key(&self, key: Key) -> bool {
        let (tx, rx) = oneshot::channel();
        self.send(UiEvent::Key(key, tx));
        rx.await.unwrap_or(false)
    }

    pub fn pointer_down(&self, target: PointerTarget) {
        self.send(UiEvent::PointerDown(target));
    }

    pub fn hover(&self, index: usize) {
        self.send(UiEvent::Hover(index));
    }

    pub fn focus(&self) {
        self.send(UiEvent::Focus);
    }

    pub fn load_more(&self) {
        self.send(UiEvent::LoadMore);
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.clone()
    }

    /// 卸载并等待后台任务退出
    pub async fn unmount(mut self) {
        self.send(UiEvent::Unmount);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("搜索面板任务异常退出: {}", e);
            }
        }
    }

    fn send(&self, event: UiEvent) {
        // 任务已退出时静默忽略
        let _ = self.events.send(event);
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.events.send(UiEvent::Unmount);
        }
    }
}

/// 在后台执行一次搜索，结果通过 `done` 交回引擎。
///
/// 接收端已关闭（面板卸载或窗口退出）时结果直接丢弃，`on_delivered` 不会被调用。
pub fn spawn_dispatch(
    runtime: &Handle,
    service: Arc<dyn SearchService>,
    request: SearchRequest,
    done: mpsc::UnboundedSender<Completion>,
    on_delivered: impl FnOnce() + Send + 'static,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let outcome = service.search(&request).await;
        let completion = Completion {
            generation: request.generation,
            outcome,
        };
        if done.send(completion).is_ok() {
            on_delivered();
        }
    })
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(due) => sleep_until(due).await,
        None => std::future::pending().await,
    }
}

async fn run_surface(
    mut engine: Engine,
    service: Arc<dyn SearchService>,
    navigator: Arc<dyn Navigator>,
    mut events: mpsc::UnboundedReceiver<UiEvent>,
    snapshots: watch::Sender<EngineSnapshot>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
    let runtime = Handle::current();

    loop {
        let effects = tokio::select! {
            event = events.recv() => match event {
                None | Some(UiEvent::Unmount) => break,
                Some(event) => handle_event(&mut engine, event),
            },
            Some(done) = done_rx.recv() => {
                engine.on_completion(done);
                Vec::new()
            }
            _ = wait_for(engine.deadline()) => engine.poll(Instant::now()),
        };

        for effect in effects {
            match effect {
                Effect::Dispatch(request) => {
                    spawn_dispatch(&runtime, service.clone(), request, done_tx.clone(), || {});
                }
                Effect::Open(item) => {
                    if let Err(e) = navigator.open(&item) {
                        warn!("跳转失败: {}", e);
                    }
                }
            }
        }

        snapshots.send_replace(engine.snapshot());
    }

    engine.teardown();
    info!("搜索面板已卸载");
}

fn handle_event(engine: &mut Engine, event: UiEvent) -> Vec<Effect> {
    match event {
        UiEvent::QueryChanged(text) => {
            engine.on_query_changed(&text);
            Vec::new()
        }
        UiEvent::FiltersChanged(filters) => {
            engine.set_filters(filters);
            Vec::new()
        }
        UiEvent::Key(key, reply) => {
            let outcome = engine.on_key(key);
            let _ = reply.send(matches!(outcome, KeyOutcome::Consumed { .. }));
            match outcome {
                KeyOutcome::Consumed {
                    effect: Some(effect),
                } => vec![effect],
                _ => Vec::new(),
            }
        }
        UiEvent::PointerDown(target) => engine.on_pointer_down(target).into_iter().collect(),
        UiEvent::Hover(index) => {
            engine.hover(index);
            Vec::new()
        }
        UiEvent::Focus => {
            engine.on_focus();
            Vec::new()
        }
        UiEvent::LoadMore => engine.load_more().into_iter().collect(),
        UiEvent::Unmount => Vec::new(),
    }
}
