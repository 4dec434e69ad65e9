use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::Instant;

use instantsearch::navigator::Navigator;
use instantsearch::surface::spawn_dispatch;
use instantsearch::types::{MatchRange, ResultItem, SearchRequest, SearchResponse};
use instantsearch::{
    Effect, Engine, EngineConfig, Key, Phase, PointerTarget, SearchError, SearchService,
    SearchSurface, SurfaceHandle,
};

/// 按查询词配置延迟和失败的假索引服务
#[derive(Default)]
struct ScriptedService {
    delays: HashMap<&'static str, Duration>,
    failing: Vec<&'static str>,
    calls: Mutex<Vec<SearchRequest>>,
}

impl ScriptedService {
    fn with_delay(mut self, query: &'static str, delay: Duration) -> Self {
        self.delays.insert(query, delay);
        self
    }

    fn failing(mut self, query: &'static str) -> Self {
        self.failing.push(query);
        self
    }

    fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|r| r.query.clone()).collect()
    }
}

fn items_for(query: &str, n: u32) -> Vec<ResultItem> {
    (1..=n)
        .map(|i| ResultItem {
            repo: "acme/api".into(),
            path: format!("src/{query}_{i}.rs"),
            language: Some("rust".into()),
            line: format!("let {query} = {i};"),
            line_number: i,
            match_ranges: vec![MatchRange::new(4, 4 + query.chars().count())],
        })
        .collect()
}

#[async_trait]
impl SearchService for ScriptedService {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.calls.lock().unwrap().push(request.clone());
        let delay = self
            .delays
            .get(request.query.as_str())
            .copied()
            .unwrap_or(Duration::from_millis(50));
        tokio::time::sleep(delay).await;
        if self.failing.iter().any(|q| *q == request.query) {
            return Err(SearchError::Status(500));
        }
        Ok(SearchResponse {
            results: items_for(&request.query, 5),
            total_count: 5,
            has_more: false,
        })
    }
}

#[derive(Default)]
struct RecordingNavigator {
    opened: Mutex<Vec<ResultItem>>,
}

impl Navigator for RecordingNavigator {
    fn open(&self, item: &ResultItem) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(item.clone());
        Ok(())
    }
}

fn mount(service: &Arc<ScriptedService>, navigator: &Arc<RecordingNavigator>) -> SurfaceHandle {
    SearchSurface::mount(
        &EngineConfig::default(),
        service.clone(),
        navigator.clone(),
    )
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_response_is_discarded() {
    let service = Arc::new(
        ScriptedService::default()
            .with_delay("abc", Duration::from_secs(2))
            .with_delay("abcd", Duration::from_millis(100)),
    );
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    surface.query_changed("abc");
    settle(400).await;
    surface.query_changed("abcd");
    settle(400).await;
    assert_eq!(service.queries(), vec!["abc", "abcd"]);

    settle(3_000).await;
    let snap = surface.snapshot();
    assert_eq!(snap.phase, Some(Phase::Open));
    assert!(snap.items.iter().all(|item| item.path.starts_with("src/abcd_")));
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn typing_within_window_dispatches_once() {
    let service = Arc::new(ScriptedService::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    surface.query_changed("abc");
    settle(100).await;
    surface.query_changed("abcd");
    settle(1_000).await;

    assert_eq!(service.queries(), vec!["abcd"]);
    assert_eq!(surface.snapshot().items.len(), 5);
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn short_query_never_reaches_service() {
    let service = Arc::new(ScriptedService::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    surface.query_changed("ab");
    settle(1_000).await;

    assert!(service.queries().is_empty());
    let snap = surface.snapshot();
    assert!(snap.items.is_empty());
    assert_eq!(snap.phase, Some(Phase::Idle));
    assert!(!snap.popup_visible);
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn keyboard_navigation_and_commit() {
    let service = Arc::new(ScriptedService::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    // 弹窗未打开时按键不被消费
    assert!(!surface.key(Key::ArrowDown).await);

    surface.query_changed("needle");
    settle(500).await;
    assert_eq!(surface.snapshot().selected, Some(0));

    for _ in 0..10 {
        assert!(surface.key(Key::ArrowDown).await);
    }
    assert_eq!(surface.snapshot().selected, Some(4));
    assert!(surface.key(Key::ArrowUp).await);
    assert!(surface.key(Key::Enter).await);
    settle(10).await;

    let opened = navigator.opened.lock().unwrap().clone();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].line_number, 4);
    let snap = surface.snapshot();
    assert_eq!(snap.phase, Some(Phase::Dismissed));
    assert_eq!(snap.query, "needle");
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn escape_hides_popup_even_with_request_in_flight() {
    let service = Arc::new(ScriptedService::default().with_delay("needles", Duration::from_secs(1)));
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    surface.query_changed("needle");
    settle(500).await;
    assert_eq!(surface.snapshot().phase, Some(Phase::Open));

    surface.query_changed("needles");
    settle(400).await;
    assert_eq!(surface.snapshot().phase, Some(Phase::Loading));
    assert!(surface.key(Key::Escape).await);
    assert_eq!(surface.snapshot().phase, Some(Phase::Dismissed));

    settle(2_000).await;
    let snap = surface.snapshot();
    assert_eq!(snap.phase, Some(Phase::Dismissed));
    assert!(!snap.popup_visible);

    // 重新聚焦直接展示缓存，不再请求
    surface.focus();
    settle(10).await;
    assert_eq!(surface.snapshot().phase, Some(Phase::Open));
    assert_eq!(service.queries(), vec!["needle", "needles"]);
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn outside_click_dismisses_error() {
    let service = Arc::new(ScriptedService::default().failing("broken"));
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    surface.query_changed("broken");
    settle(500).await;
    let snap = surface.snapshot();
    assert_eq!(snap.phase, Some(Phase::Error));
    assert!(snap.popup_visible);
    assert!(snap.error.is_some());

    surface.pointer_down(PointerTarget::Popup);
    settle(10).await;
    assert_eq!(surface.snapshot().phase, Some(Phase::Error));

    surface.pointer_down(PointerTarget::Outside);
    settle(10).await;
    assert_eq!(surface.snapshot().phase, Some(Phase::Dismissed));
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn clicking_item_opens_it() {
    let service = Arc::new(ScriptedService::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);

    surface.query_changed("needle");
    settle(500).await;
    surface.hover(3);
    surface.pointer_down(PointerTarget::Item(1));
    settle(10).await;

    let opened = navigator.opened.lock().unwrap().clone();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].line_number, 2);
    surface.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn late_response_after_unmount_is_harmless() {
    let service = Arc::new(ScriptedService::default().with_delay("needle", Duration::from_secs(2)));
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);
    let snapshots = surface.subscribe();

    surface.query_changed("needle");
    settle(500).await;
    let before = snapshots.borrow().clone();
    assert_eq!(before.phase, Some(Phase::Loading));

    surface.unmount().await;
    settle(5_000).await;

    // 服务照常返回，但没有任何状态被改动
    assert_eq!(service.queries(), vec!["needle"]);
    assert_eq!(*snapshots.borrow(), before);
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_unmounts() {
    let service = Arc::new(ScriptedService::default().with_delay("needle", Duration::from_secs(1)));
    let navigator = Arc::new(RecordingNavigator::default());
    let surface = mount(&service, &navigator);
    let snapshots = surface.subscribe();

    surface.query_changed("needle");
    settle(400).await;
    drop(surface);
    settle(2_000).await;

    assert!(snapshots.borrow().items.is_empty());
    assert!(navigator.opened.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dispatch_delivers_completion_to_engine() {
    let service = Arc::new(ScriptedService::default());
    let mut engine = Engine::new(&EngineConfig::default());
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let delivered = Arc::new(AtomicBool::new(false));

    engine.on_query_changed("foo");
    let request = match engine.poll(Instant::now() + Duration::from_millis(300)).pop() {
        Some(Effect::Dispatch(request)) => request,
        other => panic!("expected dispatch, got {other:?}"),
    };
    let flag = delivered.clone();
    spawn_dispatch(&Handle::current(), service.clone(), request, done_tx, move || {
        flag.store(true, Ordering::SeqCst)
    })
    .await
    .unwrap();

    assert!(delivered.load(Ordering::SeqCst));
    let done = done_rx.recv().await.unwrap();
    assert!(engine.on_completion(done));
    assert_eq!(engine.phase(), Phase::Open);
    assert_eq!(engine.results().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn dispatch_after_teardown_is_dropped() {
    let service = Arc::new(ScriptedService::default().with_delay("foo", Duration::from_secs(1)));
    let mut engine = Engine::new(&EngineConfig::default());
    let (done_tx, done_rx) = mpsc::unbounded_channel();
    let delivered = Arc::new(AtomicBool::new(false));

    engine.on_query_changed("foo");
    let request = match engine.poll(Instant::now() + Duration::from_millis(300)).pop() {
        Some(Effect::Dispatch(request)) => request,
        other => panic!("expected dispatch, got {other:?}"),
    };
    let flag = delivered.clone();
    let task = spawn_dispatch(&Handle::current(), service.clone(), request, done_tx, move || {
        flag.store(true, Ordering::SeqCst)
    });

    // 窗口退出：先拆除引擎，再丢掉接收端
    engine.teardown();
    drop(done_rx);
    task.await.unwrap();

    assert!(!delivered.load(Ordering::SeqCst));
    assert_eq!(service.queries(), vec!["foo"]);
    assert!(engine.results().is_empty());
}
