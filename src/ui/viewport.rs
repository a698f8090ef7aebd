//! ビューポート管理
//!
//! 画面に表示するテキスト領域のスクロール位置を管理する

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// 表示の開始行
    top_line: usize,
    /// 水平スクロール位置（表示幅の列単位）
    scroll_x: usize,
    /// 表示可能な行数
    height: usize,
    /// 表示可能な列数
    width: usize,
}

impl Viewport {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            top_line: 0,
            scroll_x: 0,
            height: height.max(1),
            width: width.max(1),
        }
    }

    /// ビューポートの寸法を更新
    pub fn set_dimensions(&mut self, height: usize, width: usize) {
        self.height = height.max(1);
        self.width = width.max(1);
    }

    /// カーソルが画面内に収まるようスクロールする
    ///
    /// 縦方向ははみ出したらカーソル行を中央に置く
    pub fn ensure_visible(&mut self, cursor_line: usize, cursor_column: usize) {
        if cursor_line < self.top_line {
            self.top_line = cursor_line;
        } else if cursor_line >= self.top_line + self.height {
            self.top_line = cursor_line.saturating_sub(self.height / 2);
        }

        if cursor_column < self.scroll_x {
            self.scroll_x = cursor_column;
        } else if cursor_column >= self.scroll_x + self.width {
            self.scroll_x = cursor_column + 1 - self.width;
        }
    }

    pub fn top_line(&self) -> usize {
        self.top_line
    }

    pub fn scroll_x(&self) -> usize {
        self.scroll_x
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
