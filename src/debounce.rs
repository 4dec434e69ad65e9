use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceSignal {
    /// 已安排一次延迟触发
    Scheduled,
    /// 输入被清空，立即清理
    Clear,
}

/// 搜索防抖：同一时刻最多只有一个待触发的查询。
///
/// 不自己起定时器，由驱动方在 `deadline()` 到期后调用 `poll`，
/// 这样卸载时只要丢掉它就不会再有任何回调。
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(Instant, String)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn on_query_changed(&mut self, text: &str) -> DebounceSignal {
        self.on_query_changed_at(text, Instant::now())
    }

    pub fn on_query_changed_at(&mut self, text: &str, now: Instant) -> DebounceSignal {
        if text.is_empty() {
            self.pending = None;
            return DebounceSignal::Clear;
        }
        // 新的触发总是顶替旧的
        self.pending = Some((now + self.delay, text.to_string()));
        DebounceSignal::Scheduled
    }

    /// 到期则取走待触发的查询
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((due, _)) if *due <= now => self.pending.take().map(|(_, text)| text),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn fires_once_after_quiet_interval() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        assert_eq!(d.on_query_changed_at("abc", t0), DebounceSignal::Scheduled);
        assert_eq!(d.poll(t0 + Duration::from_millis(299)), None);
        assert_eq!(d.poll(t0 + DELAY).as_deref(), Some("abc"));
        assert_eq!(d.poll(t0 + DELAY * 2), None);
    }

    #[test]
    fn newer_input_supersedes_pending_trigger() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.on_query_changed_at("abc", t0);
        let t1 = t0 + Duration::from_millis(200);
        d.on_query_changed_at("abcd", t1);
        // 第一次的到期时间已过，但已被顶替
        assert_eq!(d.poll(t0 + DELAY), None);
        assert_eq!(d.deadline(), Some(t1 + DELAY));
        assert_eq!(d.poll(t1 + DELAY).as_deref(), Some("abcd"));
    }

    #[test]
    fn empty_text_clears_synchronously() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.on_query_changed_at("abc", t0);
        assert_eq!(d.on_query_changed_at("", t0), DebounceSignal::Clear);
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + DELAY), None);
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debouncer::new(DELAY);
        let t0 = Instant::now();
        d.on_query_changed_at("abc", t0);
        d.cancel();
        assert_eq!(d.deadline(), None);
        assert_eq!(d.poll(t0 + DELAY), None);
    }
}
