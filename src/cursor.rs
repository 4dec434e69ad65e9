/// 键盘高亮的结果下标，始终夹在 [0, len-1] 内，不循环
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    /// 结果集换了，回到第一项
    pub fn reset(&mut self, len: usize) {
        self.index = 0;
        self.len = len;
    }

    /// 追加结果时只扩大范围，不移动位置
    pub fn extend(&mut self, len: usize) {
        self.len = len;
        self.index = self.index.min(len.saturating_sub(1));
    }

    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    pub fn move_down(&mut self) {
        if self.index + 1 < self.len {
            self.index += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// 鼠标悬停到某一项
    pub fn hover(&mut self, index: usize) {
        if index < self.len {
            self.index = index;
        }
    }
}
