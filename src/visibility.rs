//! 结果弹窗的显示状态机。
//!
//! 用一个封闭的状态枚举代替"正在加载/显示弹窗/出错"几个独立开关，
//! 避免出现"加载中且已关闭"这类互相矛盾的组合。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 没有查询，弹窗隐藏
    Idle,
    /// 防抖等待中
    Pending,
    /// 请求已发出
    Loading,
    /// 结果已采纳，弹窗显示
    Open,
    /// 请求失败，弹窗显示错误
    Error,
    /// 被 Esc、外部点击或选中结果强制隐藏，查询文本保留
    Dismissed,
}

/// 重新聚焦时当前查询的缓存情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Valid,
    InFlight,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    phase: Phase,
    /// Pending/Loading 期间是否继续显示上一次的结果
    stale_visible: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            stale_visible: false,
        }
    }
}

impl Visibility {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn popup_visible(&self) -> bool {
        match self.phase {
            Phase::Open | Phase::Error => true,
            Phase::Pending | Phase::Loading => self.stale_visible,
            Phase::Idle | Phase::Dismissed => false,
        }
    }

    pub fn showing_stale(&self) -> bool {
        matches!(self.phase, Phase::Pending | Phase::Loading) && self.stale_visible
    }

    /// 查询文本变化；过短的查询不会进入 Pending
    pub fn on_input(&mut self, dispatchable: bool) {
        if !dispatchable {
            self.clear();
            return;
        }
        // 弹窗本来开着就继续展示旧结果，直到新结果到达
        self.stale_visible = self.popup_visible();
        self.phase = Phase::Pending;
    }

    pub fn on_debounce_fired(&mut self) {
        if self.phase == Phase::Pending {
            self.phase = Phase::Loading;
        }
    }

    /// 被关闭后到达的结果只进缓存，不重新弹出
    pub fn on_success(&mut self) {
        if self.phase != Phase::Dismissed {
            self.phase = Phase::Open;
            self.stale_visible = false;
        }
    }

    pub fn on_failure(&mut self) {
        if self.phase != Phase::Dismissed {
            self.phase = Phase::Error;
            self.stale_visible = false;
        }
    }

    pub fn clear(&mut self) {
        self.phase = Phase::Idle;
        self.stale_visible = false;
    }

    /// Esc、外部点击、选中结果；弹窗不可见时不处理
    pub fn dismiss(&mut self) -> bool {
        if !self.popup_visible() {
            return false;
        }
        self.phase = Phase::Dismissed;
        self.stale_visible = false;
        true
    }

    /// 重新聚焦输入框。返回 true 表示需要重新安排防抖
    pub fn on_focus(&mut self, has_query: bool, cache: CacheState) -> bool {
        if self.phase != Phase::Dismissed || !has_query {
            return false;
        }
        match cache {
            CacheState::Valid => {
                self.phase = Phase::Open;
                false
            }
            CacheState::InFlight => {
                self.phase = Phase::Loading;
                false
            }
            CacheState::Missing => {
                self.phase = Phase::Pending;
                true
            }
        }
    }
}
